use super::ivms::{
    GEOGRAPHIC_ADDRESS, IGNORED_FIELDS, LOCAL_NAME_IDENTIFIER, NAME_IDENTIFIER,
    NATIONAL_IDENTIFICATION, PHONETIC_NAME_IDENTIFIER,
};
use super::{load_or_build, BuildOptions, DocumentBuilder};
use crate::path::{Schema, Vacancy};
use crate::{FormsResult, PrefixReader};
use serde_json::{json, Value};

pub(super) static LEGAL_PERSON_SCHEMA: Schema = Schema {
    skeleton: || {
        json!({
            "name": {
                "nameIdentifier": [],
                "localNameIdentifier": [],
                "phoneticNameIdentifier": []
            },
            "geographicAddress": [],
            "nationalIdentification": {}
        })
    },
    structures: &[
        NAME_IDENTIFIER,
        LOCAL_NAME_IDENTIFIER,
        PHONETIC_NAME_IDENTIFIER,
        GEOGRAPHIC_ADDRESS,
        NATIONAL_IDENTIFICATION,
    ],
    renames: &[],
    leaf_renames: &[],
    numeric: &[],
    vacancies: &[
        ("geographicAddress", Vacancy::EmptyList),
        ("nationalIdentification", Vacancy::Null),
    ],
    ignored: IGNORED_FIELDS,
};

/// IVMS101 legal person (a VASP or a corporate customer).
#[derive(Clone, Debug, PartialEq)]
pub struct LegalPerson {
    document: Value,
}

impl LegalPerson {
    pub const KEY: &'static str = "legalPerson";
}

impl DocumentBuilder for LegalPerson {
    fn build(reader: &PrefixReader<'_>, options: &BuildOptions) -> FormsResult<Self> {
        let document = load_or_build(&LEGAL_PERSON_SCHEMA, reader, options.amount)?;
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
