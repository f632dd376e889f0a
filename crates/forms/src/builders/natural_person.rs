use super::ivms::{
    DATE_AND_PLACE_OF_BIRTH, GEOGRAPHIC_ADDRESS, IGNORED_FIELDS, LOCAL_NAME_IDENTIFIER,
    NAME_IDENTIFIER, NATIONAL_IDENTIFICATION, PHONETIC_NAME_IDENTIFIER,
};
use super::{load_or_build, BuildOptions, DocumentBuilder};
use crate::path::{Schema, Vacancy};
use crate::{FormsResult, PrefixReader};
use serde_json::{json, Value};

pub(super) static NATURAL_PERSON_SCHEMA: Schema = Schema {
    skeleton: || {
        json!({
            "name": {
                "nameIdentifier": [],
                "localNameIdentifier": [],
                "phoneticNameIdentifier": []
            },
            "geographicAddress": [],
            "nationalIdentification": {},
            "dateAndPlaceOfBirth": {}
        })
    },
    structures: &[
        NAME_IDENTIFIER,
        LOCAL_NAME_IDENTIFIER,
        PHONETIC_NAME_IDENTIFIER,
        GEOGRAPHIC_ADDRESS,
        NATIONAL_IDENTIFICATION,
        DATE_AND_PLACE_OF_BIRTH,
    ],
    renames: &[],
    leaf_renames: &[],
    numeric: &[],
    vacancies: &[
        ("geographicAddress", Vacancy::EmptyList),
        ("nationalIdentification", Vacancy::Null),
        ("dateAndPlaceOfBirth", Vacancy::Null),
    ],
    ignored: IGNORED_FIELDS,
};

/// IVMS101 natural person built from fields such as
/// `name_nameIdentifier_0_primaryIdentifier` or `dateAndPlaceOfBirth_dateOfBirth`.
#[derive(Clone, Debug, PartialEq)]
pub struct NaturalPerson {
    document: Value,
}

impl NaturalPerson {
    pub const KEY: &'static str = "naturalPerson";
}

impl DocumentBuilder for NaturalPerson {
    fn build(reader: &PrefixReader<'_>, options: &BuildOptions) -> FormsResult<Self> {
        let document = load_or_build(&NATURAL_PERSON_SCHEMA, reader, options.amount)?;
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
