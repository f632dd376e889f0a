//! Field-name tokenizer and document assigner.
//!
//! Each entity describes its nested shape as a static [`Schema`]: a table of structural
//! prefixes ([`Structure`] rows) plus rename, numeric, and vacancy tables. The tokenizer walks a
//! field name against the table, peeling off structural prefixes and array indices, and the
//! assigner writes the value at the resulting path, creating objects and growing arrays on the
//! way.
//!
//! ```text
//! geographicAddress_2_addressLine_1
//! └─ geographicAddress_ → Field("geographicAddress"), Index(2, Address)
//!    └─ addressLine_    → Field("addressLine"), Index(1, Empty)
//! ```
//!
//! Policies:
//! - empty values are skipped before tokenizing, so they never grow an array
//! - leaf fields are last-write-wins; list indices write positionally
//! - a structural prefix with no index addresses element 0
//! - indices above [`MAX_ARRAY_INDEX`] are dropped with a warning

use crate::{FormsError, FormsResult, JSON_MARKER};
use serde_json::{Map, Number, Value};

/// Largest array index accepted from a field name.
pub const MAX_ARRAY_INDEX: usize = 255;

/// Number of address lines every new address starts with.
pub const ADDRESS_LINES: usize = 3;

/// Default value for an array element created by auto-extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placeholder {
    /// Empty string, for lists of scalars.
    Empty,
    /// Empty object.
    Object,
    /// Address object with [`ADDRESS_LINES`] empty lines under the given field name.
    Address(&'static str),
}

impl Placeholder {
    pub fn value(self) -> Value {
        match self {
            Placeholder::Empty => Value::String(String::new()),
            Placeholder::Object => Value::Object(Map::new()),
            Placeholder::Address(lines) => {
                let mut address = Map::new();
                address.insert(
                    lines.to_owned(),
                    Value::Array(vec![Value::String(String::new()); ADDRESS_LINES]),
                );
                Value::Object(address)
            }
        }
    }
}

/// What a structural prefix leads into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructureKind {
    /// A nested object (`nationalIdentification_nationalIdentifier`).
    Object,
    /// An array of objects addressed by `<index>_` (`geographicAddress_0_country`).
    Indexed(Placeholder),
    /// An array of scalars addressed by a trailing index (`addressLine_1`).
    ScalarList,
}

/// One row of a structural prefix table.
#[derive(Debug)]
pub struct Structure {
    /// Source prefix in the form vocabulary, including the trailing `_`.
    pub prefix: &'static str,
    /// Field names the prefix expands to in the document vocabulary.
    pub path: &'static [&'static str],
    pub kind: StructureKind,
    /// Table used for the remainder of the key once this row matched.
    pub nested: &'static [Structure],
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize, Placeholder),
}

impl Segment {
    /// Empty container able to hold this segment.
    fn container(&self) -> Value {
        match self {
            Segment::Field(_) => Value::Object(Map::new()),
            Segment::Index(..) => Value::Array(Vec::new()),
        }
    }
}

/// What to do with a numeric field whose value does not parse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NumericFallback {
    /// Keep the submitted text.
    #[default]
    KeepText,
    /// Fail the build with [`FormsError::MalformedNumeric`].
    Reject,
}

/// How a vacant optional substructure is emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Vacancy {
    Null,
    EmptyList,
}

/// Declarative description of how an entity's form fields map onto its document.
#[derive(Debug)]
pub struct Schema {
    /// Empty document every build starts from.
    pub skeleton: fn() -> Value,
    /// Structural prefixes, most specific first.
    pub structures: &'static [Structure],
    /// Whole-key renames applied before tokenizing.
    pub renames: &'static [(&'static str, &'static str)],
    /// Renames applied to the final leaf field name.
    pub leaf_renames: &'static [(&'static str, &'static str)],
    /// Leaf fields parsed as floating point.
    pub numeric: &'static [&'static str],
    /// Top-level substructures cleared when none of their fields got a value.
    pub vacancies: &'static [(&'static str, Vacancy)],
    /// Keys that never belong to the document (search boxes and the like).
    pub ignored: &'static [&'static str],
}

pub(crate) fn rename<'k>(table: &[(&'static str, &'static str)], key: &'k str) -> &'k str {
    table
        .iter()
        .find(|(from, _)| *from == key)
        .map(|(_, to)| *to)
        .unwrap_or(key)
}

/// Split a leading `<digits>_` off a key. A key without an index addresses element 0.
fn split_index(key: &str) -> (usize, &str) {
    let (head, tail) = key.split_once('_').unwrap_or((key, ""));
    if !head.is_empty() && head.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(index) = head.parse::<usize>() {
            return (index, tail);
        }
    }
    (0, key)
}

fn field_segment(name: &str) -> Segment {
    Segment::Field(name.to_owned())
}

fn parse_list_index(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

impl Schema {
    /// Turn a field name (already stripped of its reader prefix) into document segments.
    ///
    /// Returns `None` when nothing is left to name a leaf, e.g. `name_nameIdentifier_0`.
    pub fn tokenize(&self, key: &str) -> Option<Vec<Segment>> {
        let mut segments = Vec::new();
        let mut rest = rename(self.renames, key);
        let mut table = self.structures;

        'descend: loop {
            for structure in table {
                let Some(after) = rest.strip_prefix(structure.prefix) else {
                    continue;
                };

                let index = match structure.kind {
                    StructureKind::ScalarList => {
                        let Some(index) = parse_list_index(after) else {
                            continue;
                        };
                        segments.extend(structure.path.iter().copied().map(field_segment));
                        segments.push(Segment::Index(index, Placeholder::Empty));
                        return Some(segments);
                    }
                    StructureKind::Object => {
                        rest = after;
                        None
                    }
                    StructureKind::Indexed(placeholder) => {
                        let (index, tail) = split_index(after);
                        rest = tail;
                        Some(Segment::Index(index, placeholder))
                    }
                };

                segments.extend(structure.path.iter().copied().map(field_segment));
                segments.extend(index);
                table = structure.nested;
                continue 'descend;
            }
            break;
        }

        if rest.is_empty() {
            return None;
        }
        segments.push(Segment::Field(rename(self.leaf_renames, rest).to_owned()));
        Some(segments)
    }

    /// Convert a raw value for `field`, parsing declared numeric fields.
    ///
    /// # Errors
    ///
    /// Returns [`FormsError::MalformedNumeric`] when the field is numeric, the text does not
    /// parse to a finite number, and `fallback` is [`NumericFallback::Reject`].
    pub fn coerce(&self, field: &str, raw: &str, fallback: NumericFallback) -> FormsResult<Value> {
        if !self.numeric.iter().any(|n| *n == field) {
            return Ok(Value::String(raw.to_owned()));
        }

        let parsed = raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64);

        match (parsed, fallback) {
            (Some(number), _) => Ok(Value::Number(number)),
            (None, NumericFallback::KeepText) => {
                tracing::warn!("field '{field}' is not numeric; keeping submitted text");
                Ok(Value::String(raw.to_owned()))
            }
            (None, NumericFallback::Reject) => Err(FormsError::MalformedNumeric {
                field: field.to_owned(),
                value: raw.to_owned(),
            }),
        }
    }

    /// Assign every non-empty entry onto `root`, in order.
    pub fn apply<'e>(
        &self,
        root: &mut Value,
        entries: impl IntoIterator<Item = (&'e str, &'e str)>,
        fallback: NumericFallback,
    ) -> FormsResult<()> {
        for (key, raw) in entries {
            if raw.is_empty()
                || key.starts_with(JSON_MARKER)
                || self.ignored.iter().any(|ignored| *ignored == key)
            {
                continue;
            }

            let Some(segments) = self.tokenize(key) else {
                tracing::debug!("field '{key}' names no leaf; skipped");
                continue;
            };

            if segments
                .iter()
                .any(|s| matches!(s, Segment::Index(i, _) if *i > MAX_ARRAY_INDEX))
            {
                tracing::warn!("field '{key}' exceeds the maximum array index {MAX_ARRAY_INDEX}");
                continue;
            }

            let value = match segments.last() {
                Some(Segment::Field(leaf)) => self.coerce(leaf, raw, fallback)?,
                _ => Value::String(raw.to_owned()),
            };
            assign(root, &segments, value);
        }
        Ok(())
    }

    /// Clear vacant optional substructures according to the vacancy table.
    pub fn finish(&self, root: &mut Value) {
        for (field, vacancy) in self.vacancies {
            if let Some(value) = root.get_mut(*field) {
                if is_vacant(value) {
                    *value = match vacancy {
                        Vacancy::Null => Value::Null,
                        Vacancy::EmptyList => Value::Array(Vec::new()),
                    };
                }
            }
        }
    }

    /// Skeleton, then every entry, then vacancy clean-up.
    pub fn build<'e>(
        &self,
        entries: impl IntoIterator<Item = (&'e str, &'e str)>,
        fallback: NumericFallback,
    ) -> FormsResult<Value> {
        let mut root = (self.skeleton)();
        self.apply(&mut root, entries, fallback)?;
        self.finish(&mut root);
        Ok(root)
    }
}

/// True when no leaf under `value` carries data.
pub fn is_vacant(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
        Value::Array(items) => items.iter().all(is_vacant),
        Value::Object(map) => map.values().all(is_vacant),
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced with an object"),
    }
}

fn ensure_array(value: &mut Value, index: usize, placeholder: Placeholder) -> &mut Vec<Value> {
    if !value.is_array() {
        *value = Value::Array(Vec::new());
    }
    match value {
        Value::Array(items) => {
            while items.len() <= index {
                items.push(placeholder.value());
            }
            items
        }
        _ => unreachable!("value was just replaced with an array"),
    }
}

/// Write `value` at `segments` below `root`, creating containers as needed.
pub fn assign(root: &mut Value, segments: &[Segment], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut cursor = root;
    for (position, segment) in parents.iter().enumerate() {
        let next = &segments[position + 1];
        cursor = match segment {
            Segment::Field(name) => ensure_object(cursor)
                .entry(name.clone())
                .or_insert_with(|| next.container()),
            Segment::Index(index, placeholder) => {
                &mut ensure_array(cursor, *index, *placeholder)[*index]
            }
        };
    }

    match last {
        Segment::Field(name) => {
            ensure_object(cursor).insert(name.clone(), value);
        }
        Segment::Index(index, placeholder) => {
            ensure_array(cursor, *index, *placeholder)[*index] = value;
        }
    }
}
