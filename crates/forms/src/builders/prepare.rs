//! The "prepare transfer" payload posted from the send form.
//!
//! Unlike the envelope, prepare uses a flat vocabulary: the first token of every field name
//! picks the sub-document (`routing`, `originator`, `beneficiary`, `transfer`) and person
//! fields are renamed to `forename`, `surname`, `identification.*` and `addresses[]`.

use super::ivms::IGNORED_FIELDS;
use super::{BuildOptions, DocumentBuilder};
use crate::path::{Placeholder, Schema, Structure, StructureKind};
use crate::{FormsResult, PrefixReader, JSON_MARKER};
use envoy_types::SEPARATOR;
use serde_json::{json, Map, Value};
use std::iter;

const PERSON_SECTIONS: &[&str] = &["originator", "beneficiary"];

const PREPARED_ADDRESS_LINE: &[Structure] = &[Structure {
    prefix: "addressLine_",
    path: &["address_lines"],
    kind: StructureKind::ScalarList,
    nested: &[],
}];

static PREPARED_PERSON_SCHEMA: Schema = Schema {
    skeleton: || json!({"identification": {}, "addresses": []}),
    structures: &[
        Structure {
            prefix: "identification_",
            path: &["identification"],
            kind: StructureKind::Object,
            nested: &[],
        },
        Structure {
            prefix: "geographicAddress_",
            path: &["addresses"],
            kind: StructureKind::Indexed(Placeholder::Address("address_lines")),
            nested: PREPARED_ADDRESS_LINE,
        },
    ],
    renames: &[
        ("name_nameIdentifier_0_secondaryIdentifier", "forename"),
        ("name_nameIdentifier_0_primaryIdentifier", "surname"),
        ("countryOfResidence", "country_of_residence"),
        ("customerIdentification", "customer_id"),
        ("dateAndPlaceOfBirth_dateOfBirth", "identification_dob"),
        ("dateAndPlaceOfBirth_placeOfBirth", "identification_birth_place"),
        ("nationalIdentification_nationalIdentifierType", "identification_type_code"),
        ("nationalIdentification_nationalIdentifier", "identification_number"),
        ("nationalIdentification_countryOfIssue", "identification_country"),
    ],
    leaf_renames: &[("addressType", "address_type")],
    numeric: &["amount"],
    vacancies: &[],
    ignored: IGNORED_FIELDS,
};

/// Routing, transfer, and any other section: flat leaves.
static PREPARED_SECTION_SCHEMA: Schema = Schema {
    skeleton: || Value::Object(Map::new()),
    structures: &[],
    renames: &[],
    leaf_renames: &[],
    numeric: &["amount"],
    vacancies: &[],
    ignored: IGNORED_FIELDS,
};

fn skeleton() -> Value {
    json!({
        "routing": {},
        "originator": (PREPARED_PERSON_SCHEMA.skeleton)(),
        "beneficiary": (PREPARED_PERSON_SCHEMA.skeleton)(),
        "transfer": {}
    })
}

fn section_schema(section: &str) -> &'static Schema {
    if PERSON_SECTIONS.iter().any(|s| *s == section) {
        &PREPARED_PERSON_SCHEMA
    } else {
        &PREPARED_SECTION_SCHEMA
    }
}

/// Payload for previewing an outgoing transfer before it is sent.
#[derive(Clone, Debug, PartialEq)]
pub struct Prepare {
    document: Value,
}

impl DocumentBuilder for Prepare {
    fn build(reader: &PrefixReader<'_>, options: &BuildOptions) -> FormsResult<Self> {
        if let Some(document) = reader.load()? {
            return Ok(Self { document });
        }

        let mut document = skeleton();
        for (key, raw) in reader.entries() {
            if raw.is_empty()
                || key.starts_with(JSON_MARKER)
                || IGNORED_FIELDS.iter().any(|f| *f == key)
            {
                continue;
            }

            let Some((section, rest)) = key.split_once(SEPARATOR) else {
                // Keys without a section are top-level scalars.
                let value = PREPARED_SECTION_SCHEMA.coerce(key, raw, options.amount)?;
                if let Some(map) = document.as_object_mut() {
                    map.insert(key.to_owned(), value);
                }
                continue;
            };

            let Some(map) = document.as_object_mut() else {
                continue;
            };
            let target = map
                .entry(section.to_owned())
                .or_insert_with(|| Value::Object(Map::new()));
            if !target.is_object() {
                tracing::debug!("field '{key}' replaces scalar '{section}' with a sub-document");
                *target = Value::Object(Map::new());
            }

            section_schema(section).apply(target, iter::once((rest, raw)), options.amount)?;
        }

        Ok(Self { document })
    }

    fn document(&self) -> &Value {
        &self.document
    }

    fn into_document(self) -> Value {
        self.document
    }

    fn entries(&self) -> Vec<(String, Value)> {
        match &self.document {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FormData, FormsError, NumericFallback};

    fn prepare(pairs: &[(&str, &str)], amount: NumericFallback) -> FormsResult<Prepare> {
        let form = FormData::from_pairs(pairs.iter().copied());
        let options = BuildOptions {
            amount,
            ..BuildOptions::default()
        };
        Prepare::from_form(&form, None, &options)
    }

    #[test]
    fn builds_prepared_transfer() {
        let prepared = prepare(
            &[
                ("routing_protocol", "trisa"),
                ("routing_counterparty_id", "01HX"),
                ("originator_name_nameIdentifier_0_secondaryIdentifier", "Grace"),
                ("originator_name_nameIdentifier_0_primaryIdentifier", "Hopper"),
                ("originator_customerIdentification", "cust-1"),
                ("originator_dateAndPlaceOfBirth_dateOfBirth", "1906-12-09"),
                ("originator_nationalIdentification_nationalIdentifierType", "SOCS"),
                ("originator_geographicAddress_0_addressType", "HOME"),
                ("originator_geographicAddress_0_addressLine_0", "1 Navy Way"),
                ("originator_geographicAddress_0_country", "US"),
                ("beneficiary_countryOfResidence", "FR"),
                ("search_terms", "hopper"),
                ("transfer_amount", "0.5"),
                ("transfer_network", "BTC"),
            ],
            NumericFallback::KeepText,
        )
        .expect("prepare");

        assert_eq!(
            prepared.document(),
            &json!({
                "routing": {"protocol": "trisa", "counterparty_id": "01HX"},
                "originator": {
                    "forename": "Grace",
                    "surname": "Hopper",
                    "customer_id": "cust-1",
                    "identification": {"dob": "1906-12-09", "type_code": "SOCS"},
                    "addresses": [{
                        "address_type": "HOME",
                        "address_lines": ["1 Navy Way", "", ""],
                        "country": "US"
                    }]
                },
                "beneficiary": {
                    "identification": {},
                    "addresses": [],
                    "country_of_residence": "FR"
                },
                "transfer": {"amount": 0.5, "network": "BTC"}
            })
        );
    }

    #[test]
    fn unknown_sections_and_bare_keys() {
        let prepared = prepare(
            &[("memo_text", "hello"), ("travel_address", "ta1"), ("note", "bare")],
            NumericFallback::KeepText,
        )
        .expect("prepare");
        let doc = prepared.document();

        assert_eq!(doc["memo"], json!({"text": "hello"}));
        assert_eq!(doc["travel"], json!({"address": "ta1"}));
        assert_eq!(doc["note"], json!("bare"));
    }

    #[test]
    fn second_address_extends_with_placeholder() {
        let prepared = prepare(
            &[("originator_geographicAddress_1_country", "CA")],
            NumericFallback::KeepText,
        )
        .expect("prepare");

        assert_eq!(
            prepared.document()["originator"]["addresses"],
            json!([
                {"address_lines": ["", "", ""]},
                {"address_lines": ["", "", ""], "country": "CA"}
            ])
        );
    }

    #[test]
    fn malformed_amount_follows_policy() {
        let kept = prepare(&[("transfer_amount", "lots")], NumericFallback::KeepText)
            .expect("lenient prepare");
        assert_eq!(kept.document()["transfer"]["amount"], json!("lots"));

        let err = prepare(&[("transfer_amount", "lots")], NumericFallback::Reject)
            .expect_err("strict prepare");
        assert!(matches!(err, FormsError::MalformedNumeric { .. }));
    }

    #[test]
    fn entries_expose_each_section() {
        let prepared = prepare(&[("transfer_amount", "1")], NumericFallback::KeepText)
            .expect("prepare");
        let keys: Vec<String> = prepared.entries().into_iter().map(|(k, _)| k).collect();
        for section in ["routing", "originator", "beneficiary", "transfer"] {
            assert!(keys.iter().any(|k| k == section), "missing {section}");
        }
    }
}
