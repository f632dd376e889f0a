//! Outbound key vocabularies for the envelope.
//!
//! Envelopes are built in the IVMS101 camelCase vocabulary. The send endpoint of the back
//! office expects the same document with snake_case keys, and a few collections pluralised
//! (`nameIdentifier` becomes `name_identifiers`), so the conversion is a rename table rather
//! than a mechanical case change. Keys missing from the table pass through unchanged.

use crate::path::rename;
use serde_json::{Map, Value};

const SNAKE_CASE_KEYS: &[(&str, &str)] = &[
    // Structure.
    ("originatorPersons", "originator_persons"),
    ("beneficiaryPersons", "beneficiary_persons"),
    ("naturalPerson", "natural_person"),
    ("legalPerson", "legal_person"),
    ("originatingVASP", "originating_vasp"),
    ("beneficiaryVASP", "beneficiary_vasp"),
    ("nameIdentifier", "name_identifiers"),
    ("localNameIdentifier", "local_name_identifiers"),
    ("phoneticNameIdentifier", "phonetic_name_identifiers"),
    ("geographicAddress", "geographic_addresses"),
    ("addressLine", "address_line"),
    ("nationalIdentification", "national_identification"),
    ("dateAndPlaceOfBirth", "date_and_place_of_birth"),
    ("accountNumber", "account_numbers"),
    // Leaves.
    ("primaryIdentifier", "primary_identifier"),
    ("secondaryIdentifier", "secondary_identifier"),
    ("nameIdentifierType", "name_identifier_type"),
    ("legalPersonName", "legal_person_name"),
    ("legalPersonNameIdentifierType", "legal_person_name_identifier_type"),
    ("addressType", "address_type"),
    ("subDepartment", "sub_department"),
    ("streetName", "street_name"),
    ("buildingNumber", "building_number"),
    ("buildingName", "building_name"),
    ("postBox", "post_box"),
    ("postCode", "post_code"),
    ("townName", "town_name"),
    ("townLocationName", "town_location_name"),
    ("districtName", "district_name"),
    ("countrySubDivision", "country_sub_division"),
    ("nationalIdentifier", "national_identifier"),
    ("nationalIdentifierType", "national_identifier_type"),
    ("countryOfIssue", "country_of_issue"),
    ("registrationAuthority", "registration_authority"),
    ("dateOfBirth", "date_of_birth"),
    ("placeOfBirth", "place_of_birth"),
    ("customerIdentification", "customer_identification"),
    ("customerNumber", "customer_number"),
    ("countryOfResidence", "country_of_residence"),
    ("countryOfRegistration", "country_of_registration"),
];

/// Key vocabulary of an outbound envelope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Vocabulary {
    /// IVMS101 camelCase keys, as built.
    #[default]
    Ivms,
    /// snake_case keys for the send endpoint.
    SnakeCase,
}

impl Vocabulary {
    pub const ALL: [Vocabulary; 2] = [Vocabulary::Ivms, Vocabulary::SnakeCase];

    pub fn name(self) -> &'static str {
        match self {
            Vocabulary::Ivms => "ivms",
            Vocabulary::SnakeCase => "snake-case",
        }
    }

    /// Rewrite every object key of `document` into this vocabulary. Values are untouched.
    pub fn apply(self, document: Value) -> Value {
        match self {
            Vocabulary::Ivms => document,
            Vocabulary::SnakeCase => rename_keys(document, SNAKE_CASE_KEYS),
        }
    }
}

fn rename_keys(value: Value, table: &[(&'static str, &'static str)]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (rename(table, &key).to_owned(), rename_keys(value, table)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => {
            Value::Array(items.into_iter().map(|item| rename_keys(item, table)).collect())
        }
        scalar => scalar,
    }
}

impl std::fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Vocabulary {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Vocabulary::ALL
            .into_iter()
            .find(|vocabulary| vocabulary.name() == wanted)
            .ok_or_else(|| format!("unknown vocabulary '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renames_keys_at_every_depth() {
        let doc = json!({
            "originatorPersons": [{
                "naturalPerson": {
                    "name": {"nameIdentifier": [{"primaryIdentifier": "Hopper"}]},
                    "geographicAddress": [{"addressLine": ["1 Main St", "", ""]}]
                }
            }],
            "accountNumber": ["accountNumber"]
        });
        assert_eq!(
            Vocabulary::SnakeCase.apply(doc.clone()),
            json!({
                "originator_persons": [{
                    "natural_person": {
                        "name": {"name_identifiers": [{"primary_identifier": "Hopper"}]},
                        "geographic_addresses": [{"address_line": ["1 Main St", "", ""]}]
                    }
                }],
                "account_numbers": ["accountNumber"]
            })
        );
        assert_eq!(Vocabulary::Ivms.apply(doc.clone()), doc);
    }

    #[test]
    fn unknown_keys_pass_through() {
        let doc = json!({"txid": "0x1", "extra_json": {"memoField": 1}});
        assert_eq!(Vocabulary::SnakeCase.apply(doc.clone()), doc);
    }

    #[test]
    fn parses_vocabulary_names() {
        assert_eq!("snake_case".parse::<Vocabulary>(), Ok(Vocabulary::SnakeCase));
        assert_eq!("IVMS".parse::<Vocabulary>(), Ok(Vocabulary::Ivms));
        assert!("kebab".parse::<Vocabulary>().is_err());
        for vocabulary in Vocabulary::ALL {
            assert_eq!(vocabulary.to_string().parse::<Vocabulary>(), Ok(vocabulary));
        }
    }
}
