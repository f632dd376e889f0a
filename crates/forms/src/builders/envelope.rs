//! Composite travel rule envelope: IVMS101 identity plus transaction.
//!
//! Field layout:
//!
//! | Field prefix                          | Document location                                   |
//! |---------------------------------------|-----------------------------------------------------|
//! | `originator_naturalPerson_`           | `identity.originator.originatorPersons[]`           |
//! | `originator_legalPerson_`             | `identity.originator.originatorPersons[]`           |
//! | `originator_accountNumber_<i>`        | `identity.originator.accountNumber[i]`              |
//! | `beneficiary_...`                     | `identity.beneficiary...` (same shape)              |
//! | `originatingVASP_legalPerson_`        | `identity.originatingVASP.originatingVASP`          |
//! | `beneficiaryVASP_legalPerson_`        | `identity.beneficiaryVASP.beneficiaryVASP`          |
//! | `transaction_`                        | `transaction`                                       |
//! | `sent_at`, `received_at`, `transfer_state` | top level                                      |
//!
//! Any scope may instead be submitted whole as `json:<prefix>`.
//!
//! The built document uses IVMS101 keys; [`Envelope::in_vocabulary`] converts it for
//! endpoints that expect snake_case.

use super::ivms::{ACCOUNT_NUMBER, IGNORED_FIELDS};
use super::{
    BuildOptions, DocumentBuilder, LegalPerson, NaturalPerson, Transaction, Vocabulary,
};
use crate::path::{is_vacant, NumericFallback, Schema};
use crate::{FormsResult, PrefixReader};
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

/// Top-level scalar fields copied onto the envelope.
const TOP_LEVEL_SCALARS: &[&str] = &["sent_at", "received_at", "transfer_state"];

/// Order in which [`Envelope::entries`] yields the top-level keys it knows about.
const ENTRY_ORDER: &[&str] = &["identity", "transaction", "sent_at", "received_at", "transfer_state"];

static ACCOUNT_SCHEMA: Schema = Schema {
    skeleton: || Value::Object(Map::new()),
    structures: &[ACCOUNT_NUMBER],
    renames: &[],
    leaf_renames: &[],
    numeric: &[],
    vacancies: &[],
    ignored: IGNORED_FIELDS,
};

#[derive(Clone, Copy, Debug)]
enum Party {
    Originator,
    Beneficiary,
}

impl Party {
    fn prefix(self) -> &'static str {
        match self {
            Party::Originator => "originator",
            Party::Beneficiary => "beneficiary",
        }
    }

    fn persons_key(self) -> &'static str {
        match self {
            Party::Originator => "originatorPersons",
            Party::Beneficiary => "beneficiaryPersons",
        }
    }

    /// Build `identity.<party>` from the party's scope.
    fn build(self, reader: &PrefixReader<'_>, options: &BuildOptions) -> FormsResult<Value> {
        let scope = reader.scoped(self.prefix())?;
        if let Some(document) = scope.load()? {
            return Ok(document);
        }

        let mut persons = Vec::new();

        let natural = NaturalPerson::build(&scope.scoped(NaturalPerson::KEY)?, options)?;
        if !is_vacant(natural.document()) {
            persons.push(Value::Object(natural.entries().into_iter().collect()));
        }

        let legal = LegalPerson::build(&scope.scoped(LegalPerson::KEY)?, options)?;
        if !is_vacant(legal.document()) {
            persons.push(Value::Object(legal.entries().into_iter().collect()));
        }

        let account_prefix = ACCOUNT_NUMBER.prefix;
        let accounts = ACCOUNT_SCHEMA.build(
            scope
                .entries()
                .filter(|(key, _)| key.starts_with(account_prefix)),
            NumericFallback::KeepText,
        )?;

        let mut party = Map::new();
        party.insert(self.persons_key().to_owned(), Value::Array(persons));
        party.insert(
            "accountNumber".to_owned(),
            accounts
                .get("accountNumber")
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        );
        Ok(Value::Object(party))
    }
}

/// Replace the party's account numbers with the single account the transaction names.
fn enrich_account(party: &mut Value, account: Option<&str>) {
    let (Some(account), Some(party)) = (account, party.as_object_mut()) else {
        return;
    };
    party.insert(
        "accountNumber".to_owned(),
        Value::Array(vec![Value::String(account.to_owned())]),
    );
}

/// Build `identity.<key>.<key>.legalPerson` for a VASP, if the form describes one.
fn build_vasp(
    key: &str,
    reader: &PrefixReader<'_>,
    options: &BuildOptions,
) -> FormsResult<Option<Value>> {
    let scope = reader.scoped(key)?;
    if let Some(document) = scope.load()? {
        return Ok(Some(document));
    }

    let vasp = LegalPerson::build(&scope.scoped(LegalPerson::KEY)?, options)?;
    if is_vacant(vasp.document()) {
        return Ok(None);
    }

    let mut wrapper = Map::new();
    wrapper.insert(
        key.to_owned(),
        Value::Object(vasp.entries().into_iter().collect()),
    );
    Ok(Some(Value::Object(wrapper)))
}

/// The travel rule payload posted when sending, accepting, or repairing a transfer.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    document: Value,
}

impl Envelope {
    /// The same envelope with its keys rewritten into `vocabulary`.
    pub fn in_vocabulary(self, vocabulary: Vocabulary) -> Self {
        Self {
            document: vocabulary.apply(self.document),
        }
    }
}

impl DocumentBuilder for Envelope {
    fn build(reader: &PrefixReader<'_>, options: &BuildOptions) -> FormsResult<Self> {
        if let Some(document) = reader.load()? {
            return Ok(Self { document });
        }

        let transaction = Transaction::build(&reader.scoped(Transaction::KEY)?, options)?;

        let mut originator = Party::Originator.build(reader, options)?;
        let mut beneficiary = Party::Beneficiary.build(reader, options)?;

        // One-time copy of the wallet addresses into the parties' account numbers.
        enrich_account(&mut originator, transaction.account("originator"));
        enrich_account(&mut beneficiary, transaction.account("beneficiary"));

        let mut identity = Map::new();
        identity.insert("originator".to_owned(), originator);
        identity.insert("beneficiary".to_owned(), beneficiary);
        for key in ["originatingVASP", "beneficiaryVASP"] {
            if let Some(vasp) = build_vasp(key, reader, options)? {
                identity.insert(key.to_owned(), vasp);
            }
        }

        let mut document = Map::new();
        document.insert("identity".to_owned(), Value::Object(identity));
        document.insert(Transaction::KEY.to_owned(), transaction.into_document());

        // Last non-empty submission wins.
        let scalars = reader
            .entries()
            .filter(|(key, raw)| !raw.is_empty() && TOP_LEVEL_SCALARS.iter().any(|f| f == key));
        for (key, raw) in scalars {
            document.insert(key.to_owned(), Value::String(raw.to_owned()));
        }

        if options.stamp_sent_at && !document.contains_key("sent_at") {
            let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
            tracing::debug!("stamping envelope sent_at {now}");
            document.insert("sent_at".to_owned(), Value::String(now));
        }

        Ok(Self {
            document: Value::Object(document),
        })
    }

    fn document(&self) -> &Value {
        &self.document
    }

    fn into_document(self) -> Value {
        self.document
    }

    fn entries(&self) -> Vec<(String, Value)> {
        let Some(map) = self.document.as_object() else {
            return Vec::new();
        };

        let known = ENTRY_ORDER
            .iter()
            .filter_map(|key| map.get(*key).map(|v| ((*key).to_owned(), v.clone())));
        let others = map
            .iter()
            .filter(|(key, _)| !ENTRY_ORDER.iter().any(|k| *k == key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()));
        known.chain(others).collect()
    }
}
