//! Per-entity document builders.
//!
//! Every builder reads its fields through a [`PrefixReader`]. If the form carries the whole
//! sub-document pre-serialised (`json:<prefix>`), that document is used verbatim; otherwise the
//! entity's [`Schema`](crate::path::Schema) assigns each field into a fresh skeleton.

mod envelope;
mod ivms;
mod legal_person;
mod natural_person;
mod prepare;
mod transaction;
mod vocabulary;

pub use envelope::Envelope;
pub use legal_person::LegalPerson;
pub use natural_person::NaturalPerson;
pub use prepare::Prepare;
pub use transaction::Transaction;
pub use vocabulary::Vocabulary;

use crate::path::{NumericFallback, Schema};
use crate::{FormData, FormsResult, PrefixReader};
use serde_json::Value;

/// Caller-chosen policies for a build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Policy for `amount` fields that do not parse as numbers.
    pub amount: NumericFallback,
    /// Stamp `sent_at` with the current time when the form does not supply one.
    pub stamp_sent_at: bool,
}

/// A nested document built from one scope of a form.
pub trait DocumentBuilder: Sized {
    /// Build from the fields visible to `reader`.
    fn build(reader: &PrefixReader<'_>, options: &BuildOptions) -> FormsResult<Self>;

    /// The built document.
    fn document(&self) -> &Value;

    fn into_document(self) -> Value;

    /// Top-level `(key, value)` pairs this entity contributes to an outer document.
    fn entries(&self) -> Vec<(String, Value)>;

    /// Build from a raw form, scoped to `prefix` when one is given.
    fn from_form(form: &FormData, prefix: Option<&str>, options: &BuildOptions) -> FormsResult<Self> {
        let reader = match prefix {
            Some(prefix) => PrefixReader::with_prefix(form, prefix)?,
            None => PrefixReader::root(form),
        };
        Self::build(&reader, options)
    }
}

/// Preloaded document if the form carries one, otherwise a field-by-field build.
fn load_or_build(
    schema: &Schema,
    reader: &PrefixReader<'_>,
    fallback: NumericFallback,
) -> FormsResult<Value> {
    if let Some(document) = reader.load()? {
        tracing::debug!(
            "using preloaded document for '{}'",
            reader.prefix().map(|p| p.as_str()).unwrap_or_default()
        );
        return Ok(document);
    }
    schema.build(reader.entries(), fallback)
}
