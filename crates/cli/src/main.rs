use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use envoy_forms::choices::{with_placeholder, ChoiceKind};
use envoy_forms::{
    transport, BuildOptions, DocumentBuilder, Envelope, FormData, FormInput, LegalPerson,
    NaturalPerson, NumericFallback, Prepare, Transaction, Vocabulary,
};
use serde_json::Value;
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "envoy")]
#[command(about = "Map travel rule form submissions onto IVMS101 documents")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a travel rule envelope
    Envelope {
        #[command(flatten)]
        build: BuildArgs,
        /// Print urlencoded transport parameters instead of JSON
        #[arg(long)]
        urlencoded: bool,
        /// Output key vocabulary (ivms or snake-case)
        #[arg(long, default_value_t = Vocabulary::Ivms)]
        vocabulary: Vocabulary,
    },
    /// Build the prepare-transfer payload from send form fields
    Prepare {
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Build an IVMS101 natural or legal person
    Person {
        #[arg(value_enum)]
        kind: PersonKind,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Build transaction details
    Transaction {
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Flatten a JSON document into urlencoded transport parameters
    Encode {
        /// JSON document (default: stdin)
        input: Option<PathBuf>,
    },
    /// Decode urlencoded transport parameters into JSON
    Decode {
        /// Urlencoded parameters (default: stdin)
        input: Option<PathBuf>,
    },
    /// List an IVMS101 code list
    Choices {
        /// List name, e.g. address-type (omit to list the names)
        kind: Option<String>,
        /// Prepend the "please select" entry
        #[arg(long)]
        placeholder: bool,
    },
}

#[derive(Args)]
struct BuildArgs {
    /// Form submission (default: stdin)
    input: Option<PathBuf>,
    /// Input encoding
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    format: InputFormat,
    /// Read only the fields under this prefix
    #[arg(long)]
    prefix: Option<String>,
    /// Reject malformed amounts instead of keeping their text
    #[arg(long)]
    strict: bool,
    /// Stamp sent_at with the current time when absent
    #[arg(long)]
    stamp_sent_at: bool,
}

impl BuildArgs {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            amount: if self.strict {
                NumericFallback::Reject
            } else {
                NumericFallback::KeepText
            },
            stamp_sent_at: self.stamp_sent_at,
        }
    }

    fn build<B: DocumentBuilder>(&self) -> anyhow::Result<B> {
        let text = read_input(self.input.as_ref())?;
        let form = parse_form(&text, self.format)?;
        tracing::debug!("read {} fields", form.len());
        Ok(B::from_form(&form, self.prefix.as_deref(), &self.options())?)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// JSON if the input starts with `{`, urlencoded otherwise
    Auto,
    Urlencoded,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PersonKind {
    Natural,
    Legal,
}

fn read_input(path: Option<&PathBuf>) -> anyhow::Result<String> {
    match path {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn parse_form(text: &str, format: InputFormat) -> anyhow::Result<FormData> {
    let text = text.trim();
    let json = match format {
        InputFormat::Json => true,
        InputFormat::Urlencoded => false,
        InputFormat::Auto => text.starts_with('{'),
    };

    let input = if json {
        let value: Value = serde_json::from_str(text).context("input is not valid JSON")?;
        FormInput::Json(value)
    } else {
        FormInput::Urlencoded(text.to_owned())
    };
    Ok(input.into_form_data()?)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("envoy=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Envelope {
            build,
            urlencoded,
            vocabulary,
        }) => {
            let envelope = build.build::<Envelope>()?.in_vocabulary(vocabulary);
            if urlencoded {
                let params = transport::encode_entries(envelope.entries())?;
                println!("{}", params.to_urlencoded());
            } else {
                print_json(envelope.document())?;
            }
        }
        Some(Commands::Prepare { build }) => {
            let prepared: Prepare = build.build()?;
            print_json(prepared.document())?;
        }
        Some(Commands::Person { kind, build }) => {
            let document = match kind {
                PersonKind::Natural => build.build::<NaturalPerson>()?.into_document(),
                PersonKind::Legal => build.build::<LegalPerson>()?.into_document(),
            };
            print_json(&document)?;
        }
        Some(Commands::Transaction { build }) => {
            let transaction: Transaction = build.build()?;
            print_json(transaction.document())?;
        }
        Some(Commands::Encode { input }) => {
            let text = read_input(input.as_ref())?;
            let document: Value =
                serde_json::from_str(&text).context("document is not valid JSON")?;
            let params = transport::encode_document(&document)?;
            println!("{}", params.to_urlencoded());
        }
        Some(Commands::Decode { input }) => {
            let text = read_input(input.as_ref())?;
            let form = FormData::from_urlencoded(text.trim())?;
            print_json(&transport::decode_parameters(&form)?)?;
        }
        Some(Commands::Choices { kind, placeholder }) => {
            let Some(kind) = kind else {
                for kind in ChoiceKind::ALL {
                    println!("{kind}");
                }
                return Ok(());
            };
            let kind: ChoiceKind = kind.parse().map_err(anyhow::Error::msg)?;
            let options = kind.options();
            let choices = if placeholder {
                with_placeholder(&options, kind.placeholder())
            } else {
                options
            };
            for choice in choices {
                println!("{}\t{}", choice.value, choice.label);
            }
        }
        None => {
            println!("Use 'envoy --help' for commands");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_build_flags() {
        let cli = Cli::try_parse_from([
            "envoy",
            "person",
            "legal",
            "form.txt",
            "--prefix",
            "vasp",
            "--strict",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Person { kind, build }) => {
                assert_eq!(kind, PersonKind::Legal);
                assert_eq!(build.prefix.as_deref(), Some("vasp"));
                assert_eq!(build.options().amount, NumericFallback::Reject);
                assert_eq!(build.format, InputFormat::Auto);
            }
            _ => panic!("expected person command"),
        }
    }

    #[test]
    fn parses_envelope_vocabulary() {
        let cli = Cli::try_parse_from(["envoy", "envelope", "--vocabulary", "snake_case"]).unwrap();
        match cli.command {
            Some(Commands::Envelope { vocabulary, urlencoded, .. }) => {
                assert_eq!(vocabulary, Vocabulary::SnakeCase);
                assert!(!urlencoded);
            }
            _ => panic!("expected envelope command"),
        }

        let cli = Cli::try_parse_from(["envoy", "envelope"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Envelope { vocabulary: Vocabulary::Ivms, .. })
        ));
        assert!(Cli::try_parse_from(["envoy", "envelope", "--vocabulary", "camel"]).is_err());
    }

    #[test]
    fn detects_input_format() {
        let form = parse_form(r#"{"a": "1", "b": ["x", "y"]}"#, InputFormat::Auto).unwrap();
        assert_eq!(form.get_all("b"), vec!["x", "y"]);

        let form = parse_form("a=1&b=two+words\n", InputFormat::Auto).unwrap();
        assert_eq!(form.get("b"), Some("two words"));

        assert!(parse_form("a=1", InputFormat::Json).is_err());
    }

    #[test]
    fn builds_from_parsed_form() {
        let form = parse_form("transaction_amount=2&transaction_txid=0x1", InputFormat::Auto)
            .unwrap();
        let tx = Transaction::from_form(&form, Some("transaction"), &BuildOptions::default())
            .unwrap();
        assert_eq!(tx.document(), &json!({"amount": 2.0, "txid": "0x1"}));
    }
}
