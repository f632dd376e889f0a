//! Prefix-scoped views over a submitted form.
//!
//! A single HTML form usually carries several independent sub-documents (originator,
//! beneficiary, transaction). Each builder reads its own part of the form through a
//! [`PrefixReader`], which only sees fields named `<prefix>_...` and hands them out with the
//! prefix removed, so the same field tables work wherever the sub-document is placed.

use crate::{FormData, FormsError, FormsResult, Prefix};
use serde_json::Value;

/// The kinds of input a form can be read from.
#[derive(Clone, Debug)]
pub enum FormInput {
    /// Already-parsed fields.
    Fields(FormData),
    /// An `application/x-www-form-urlencoded` body.
    Urlencoded(String),
    /// A JSON object of field names to scalar values (or arrays of scalars for repeated
    /// fields). JSON objects carry no submission order, so fields are read in key order.
    Json(Value),
}

impl FormInput {
    /// Normalise the input into [`FormData`].
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::InvalidInputKind`] if a JSON input is not an object, or any field
    /// holds a nested object or a nested array, and [`FormsError::InvalidEncoding`] for a
    /// malformed urlencoded body.
    pub fn into_form_data(self) -> FormsResult<FormData> {
        match self {
            FormInput::Fields(form) => Ok(form),
            FormInput::Urlencoded(body) => FormData::from_urlencoded(&body),
            FormInput::Json(value) => form_from_json(value),
        }
    }
}

fn form_from_json(value: Value) -> FormsResult<FormData> {
    let Value::Object(map) = value else {
        return Err(FormsError::InvalidInputKind(format!(
            "expected an object of form fields, got {}",
            kind_name(&value)
        )));
    };

    let mut form = FormData::new();
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    let text = scalar_text(&key, item)?;
                    form.append(key.clone(), text);
                }
            }
            other => {
                let text = scalar_text(&key, other)?;
                form.append(key, text);
            }
        }
    }
    Ok(form)
}

fn scalar_text(key: &str, value: Value) -> FormsResult<String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        nested => Err(FormsError::InvalidInputKind(format!(
            "field '{key}' holds a nested {}",
            kind_name(&nested)
        ))),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read-only view of the fields of a form that fall under one prefix.
#[derive(Clone, Debug)]
pub struct PrefixReader<'a> {
    form: &'a FormData,
    prefix: Option<Prefix>,
}

impl<'a> PrefixReader<'a> {
    pub fn new(form: &'a FormData, prefix: Option<Prefix>) -> Self {
        Self { form, prefix }
    }

    /// A reader that sees every field of the form.
    pub fn root(form: &'a FormData) -> Self {
        Self::new(form, None)
    }

    /// A reader scoped to `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::InvalidPrefix`] if `prefix` is not a valid field scope.
    pub fn with_prefix(form: &'a FormData, prefix: &str) -> FormsResult<Self> {
        Ok(Self::new(form, Some(Prefix::new(prefix)?)))
    }

    /// A reader over the same form, scoped one level deeper than this one.
    pub fn scoped(&self, child: &str) -> FormsResult<PrefixReader<'a>> {
        let child = Prefix::new(child)?;
        let prefix = match &self.prefix {
            Some(parent) => parent.join(&child),
            None => child,
        };
        Ok(PrefixReader::new(self.form, Some(prefix)))
    }

    pub fn prefix(&self) -> Option<&Prefix> {
        self.prefix.as_ref()
    }

    /// Full field name of `key` within this reader's scope.
    pub fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => prefix.field(key),
            None => key.to_owned(),
        }
    }

    pub fn has(&self, key: &str) -> bool {
        self.form.has(&self.full_key(key))
    }

    /// First value submitted for `key` within the scope.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.form.get(&self.full_key(key))
    }

    /// Fields within the scope as `(key without prefix, value)`, in submission order.
    ///
    /// Every call rescans the form.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.form.iter().filter_map(move |entry| {
            let key = match &self.prefix {
                Some(prefix) => prefix.strip(&entry.key)?,
                None => entry.key.as_str(),
            };
            Some((key, entry.value.as_str()))
        })
    }

    /// A sub-document submitted pre-serialised as `json:<prefix>`.
    ///
    /// Returns `Ok(None)` when the reader has no prefix or the field is absent or empty.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::InvalidJson`] if the field is present but is not valid JSON.
    pub fn load(&self) -> FormsResult<Option<Value>> {
        let Some(prefix) = &self.prefix else {
            return Ok(None);
        };

        let key = prefix.json_field();
        match self.form.get(&key) {
            Some(text) if !text.trim().is_empty() => serde_json::from_str(text)
                .map(Some)
                .map_err(|source| FormsError::InvalidJson { key, source }),
            _ => Ok(None),
        }
    }
}
