use super::ivms::IGNORED_FIELDS;
use super::{load_or_build, BuildOptions, DocumentBuilder};
use crate::path::Schema;
use crate::{FormsResult, PrefixReader};
use serde_json::{Map, Value};

pub(super) static TRANSACTION_SCHEMA: Schema = Schema {
    skeleton: || Value::Object(Map::new()),
    structures: &[],
    renames: &[],
    leaf_renames: &[],
    numeric: &["amount"],
    vacancies: &[],
    ignored: IGNORED_FIELDS,
};

/// Generic transaction details: `txid`, `originator` and `beneficiary` wallet addresses,
/// `amount`, `network`, `asset_type`, `tag`, `timestamp`, `extra_json`.
///
/// Every field is a flat leaf; `amount` is parsed as a float subject to
/// [`BuildOptions::amount`].
#[derive(Clone, Debug, PartialEq)]
pub struct Transaction {
    document: Value,
}

impl Transaction {
    pub const KEY: &'static str = "transaction";

    /// Non-empty string value of a transaction field.
    pub fn account(&self, field: &str) -> Option<&str> {
        self.document
            .get(field)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl DocumentBuilder for Transaction {
    fn build(reader: &PrefixReader<'_>, options: &BuildOptions) -> FormsResult<Self> {
        let document = load_or_build(&TRANSACTION_SCHEMA, reader, options.amount)?;
        Ok(Self { document })
    }

    fn document(&self) -> &Value {
        &self.document
    }

    fn into_document(self) -> Value {
        self.document
    }

    fn entries(&self) -> Vec<(String, Value)> {
        vec![(Self::KEY.to_owned(), self.document.clone())]
    }
}
