//! Conversion between built documents and the flat transport form.
//!
//! The page-update protocol only carries string parameters, so structured values travel as
//! JSON text under a `json:<key>` parameter. The receiving side collapses repeated keys into
//! arrays and parses anything carrying the marker.

use crate::{FieldEntry, FormData, FormsError, FormsResult, TransportKey};
use serde_json::{Map, Value};

/// Flatten top-level `(key, value)` pairs into transport parameters.
///
/// Objects, arrays, and nulls are JSON-encoded under `json:<key>`; strings pass through
/// unchanged and other scalars are sent as their JSON text.
pub fn encode_entries<I>(entries: I) -> FormsResult<FormData>
where
    I: IntoIterator<Item = (String, Value)>,
{
    let mut form = FormData::new();
    for (key, value) in entries {
        match value {
            Value::String(text) => form.append(key, text),
            Value::Bool(_) | Value::Number(_) => form.append(key, value.to_string()),
            structured => {
                let text = serde_json::to_string(&structured).map_err(FormsError::Serialization)?;
                form.append(TransportKey::Json(key).to_string(), text);
            }
        }
    }
    Ok(form)
}

/// Flatten a whole document. The document must be a JSON object.
pub fn encode_document(document: &Value) -> FormsResult<FormData> {
    let Value::Object(map) = document else {
        return Err(FormsError::InvalidInputKind(
            "only objects can be encoded as transport parameters".to_owned(),
        ));
    };
    encode_entries(map.iter().map(|(k, v)| (k.clone(), v.clone())))
}

/// Decode transport parameters into the JSON object the server receives.
///
/// Keys seen once become scalars, repeated keys become arrays, and `json:` keys lose their
/// marker and have each value parsed as JSON.
///
/// # Errors
///
/// Returns [`FormsError::InvalidJson`] if a `json:` parameter does not hold valid JSON.
pub fn decode_parameters(form: &FormData) -> FormsResult<Value> {
    let mut object = Map::new();
    for (raw, values) in form.grouped() {
        let key = TransportKey::parse(raw);

        let mut decoded = Vec::with_capacity(values.len());
        for text in values {
            decoded.push(if key.is_json() {
                serde_json::from_str(text).map_err(|source| FormsError::InvalidJson {
                    key: raw.to_owned(),
                    source,
                })?
            } else {
                Value::String(text.to_owned())
            });
        }

        let value = match decoded.len() {
            1 => decoded.remove(0),
            _ => Value::Array(decoded),
        };
        object.insert(key.name().to_owned(), value);
    }
    Ok(Value::Object(object))
}

/// Zip repeated column fields (`<group>_<column>`) into a `json:<group>` array of rows.
///
/// The first column sets the number of rows; a shorter column leaves its field out of the
/// trailing rows. The column fields are removed from the form.
pub fn collect_rows(form: &mut FormData, group: &str, columns: &[&str]) -> FormsResult<()> {
    let fields: Vec<(String, Vec<String>)> = columns
        .iter()
        .map(|column| {
            let field = format!("{group}_{column}");
            let values = form.get_all(&field).into_iter().map(str::to_owned).collect();
            (field, values)
        })
        .collect();

    let count = fields.first().map(|(_, values)| values.len()).unwrap_or_default();
    let rows: Vec<Value> = (0..count)
        .map(|row| {
            let cells = columns
                .iter()
                .zip(&fields)
                .filter_map(|(column, (_, values))| {
                    values
                        .get(row)
                        .map(|v| ((*column).to_owned(), Value::String(v.clone())))
                })
                .collect::<Map<String, Value>>();
            Value::Object(cells)
        })
        .collect();

    for (field, _) in &fields {
        form.delete(field);
    }

    tracing::debug!("collected {} '{group}' rows", rows.len());
    let text = serde_json::to_string(&rows).map_err(FormsError::Serialization)?;
    form.append(TransportKey::Json(group.to_owned()).to_string(), text);
    Ok(())
}

/// Rewrite an HTML checkbox (`on` when ticked) as a `json:<key>` boolean, in place.
pub fn checkbox_to_json(form: &mut FormData, key: &str) {
    let rewritten: FormData = form
        .iter()
        .map(|entry| {
            if entry.key != key {
                return entry.clone();
            }
            let checked = if entry.value == "on" { "true" } else { "false" };
            FieldEntry::new(TransportKey::Json(key.to_owned()).to_string(), checked)
        })
        .collect();
    *form = rewritten;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{BuildOptions, DocumentBuilder, NaturalPerson, Transaction};
    use serde_json::json;

    #[test]
    fn structured_values_are_tagged() {
        let form = encode_entries([
            ("identity".to_owned(), json!({"originator": {"accountNumber": ["a"]}})),
            ("addresses".to_owned(), json!([1, 2])),
            ("sent_at".to_owned(), json!("2024-05-01T12:00:00Z")),
            ("retry".to_owned(), json!(true)),
            ("received_at".to_owned(), Value::Null),
        ])
        .unwrap();

        assert_eq!(
            form.keys(),
            vec!["json:identity", "json:addresses", "sent_at", "retry", "json:received_at"]
        );
        let identity: Value = serde_json::from_str(form.get("json:identity").unwrap()).unwrap();
        assert_eq!(identity, json!({"originator": {"accountNumber": ["a"]}}));
        assert_eq!(form.get("sent_at"), Some("2024-05-01T12:00:00Z"));
        assert_eq!(form.get("retry"), Some("true"));
        assert_eq!(form.get("json:received_at"), Some("null"));
    }

    #[test]
    fn builder_entries_survive_transport() {
        let form = FormData::from_pairs([("countryOfResidence", "US")]);
        let person = NaturalPerson::from_form(&form, None, &BuildOptions::default()).unwrap();

        let transport = encode_entries(person.entries()).unwrap();
        let decoded = decode_parameters(&transport).unwrap();
        assert_eq!(decoded["naturalPerson"], *person.document());
    }

    #[test]
    fn amounts_survive_transport_exactly() {
        for amount in ["93399060.016231092", "29.983844738297539", "0.1", "1e-7"] {
            let form = FormData::from_pairs([("transaction_amount", amount)]);
            let tx = Transaction::from_form(&form, Some("transaction"), &BuildOptions::default())
                .unwrap();
            assert!(tx.document()["amount"].is_f64(), "{amount} parsed as a number");

            let decoded = decode_parameters(&encode_entries(tx.entries()).unwrap()).unwrap();
            assert_eq!(decoded["transaction"], *tx.document(), "{amount}");
        }
    }

    #[test]
    fn decodes_repeated_and_tagged_parameters() {
        let form = FormData::from_pairs([
            ("network", "BTC"),
            ("tag", "a"),
            ("tag", "b"),
            ("json:retry", "true"),
            ("json:rows", "{\"n\": 1}"),
            ("json:rows", "{\"n\": 2}"),
        ]);

        assert_eq!(
            decode_parameters(&form).unwrap(),
            json!({
                "network": "BTC",
                "tag": ["a", "b"],
                "retry": true,
                "rows": [{"n": 1}, {"n": 2}]
            })
        );
    }

    #[test]
    fn bad_tagged_json_is_an_error() {
        let form = FormData::from_pairs([("json:identity", "{not json")]);
        match decode_parameters(&form) {
            Err(FormsError::InvalidJson { key, .. }) => assert_eq!(key, "json:identity"),
            other => panic!("expected InvalidJson, got {other:?}"),
        }
    }

    #[test]
    fn encode_document_requires_object() {
        assert!(matches!(
            encode_document(&json!([1])),
            Err(FormsError::InvalidInputKind(_))
        ));
        let form = encode_document(&json!({"a": "b"})).unwrap();
        assert_eq!(form.get("a"), Some("b"));
    }

    #[test]
    fn collects_wallet_rows() {
        let mut form = FormData::from_pairs([
            ("first_name", "Ada"),
            ("crypto_addresses_crypto_address", "bc1qa"),
            ("crypto_addresses_network", "BTC"),
            ("crypto_addresses_crypto_address", "0xb"),
            ("crypto_addresses_network", "ETH"),
            ("crypto_addresses_crypto_address", "r3c"),
        ]);
        collect_rows(&mut form, "crypto_addresses", &["crypto_address", "network"]).unwrap();

        assert_eq!(form.keys(), vec!["first_name", "json:crypto_addresses"]);
        let rows: Value = serde_json::from_str(form.get("json:crypto_addresses").unwrap()).unwrap();
        assert_eq!(
            rows,
            json!([
                {"crypto_address": "bc1qa", "network": "BTC"},
                {"crypto_address": "0xb", "network": "ETH"},
                {"crypto_address": "r3c"}
            ])
        );
    }

    #[test]
    fn checkbox_becomes_json_boolean() {
        let mut form = FormData::from_pairs([("reason", "bad"), ("retry", "on"), ("other", "x")]);
        checkbox_to_json(&mut form, "retry");
        assert_eq!(form.keys(), vec!["reason", "json:retry", "other"]);
        assert_eq!(decode_parameters(&form).unwrap()["retry"], json!(true));

        let mut form = FormData::from_pairs([("retry", "off")]);
        checkbox_to_json(&mut form, "retry");
        assert_eq!(form.get("json:retry"), Some("false"));
    }
}
