//! Shared primitives for the envoy form mapper.
//!
//! Form fields are named with underscore-delimited paths (`originator_naturalPerson_...`).
//! A [`Prefix`] names one scope of such a path, and a [`TransportKey`] names one parameter of
//! the flat transport form, where structured values travel as JSON text under a `json:` key.

/// Marker prepended to transport keys whose value is JSON text rather than a plain string.
pub const JSON_MARKER: &str = "json:";

/// Separator between path segments in form field names.
pub const SEPARATOR: char = '_';

/// Errors that can occur when creating validated form primitives.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TypesError {
    /// The input text was empty or contained only whitespace
    #[error("prefix cannot be empty")]
    EmptyPrefix,
    /// The prefix contained characters that cannot appear in a field name
    #[error("prefix '{0}' must be ASCII without whitespace")]
    InvalidPrefixCharacters(String),
    /// The prefix started or ended with the path separator
    #[error("prefix '{0}' must not start or end with '_'")]
    DanglingSeparator(String),
}

/// A validated field-name scope such as `originator` or `originator_naturalPerson`.
///
/// Prefixes never carry the trailing separator; [`Prefix::field`] adds it when building the
/// full name of a field inside the scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Prefix(String);

impl Prefix {
    /// Creates a new `Prefix`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError`] if the trimmed input is empty, contains non-ASCII or
    /// whitespace characters, or begins or ends with `_`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TypesError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TypesError::EmptyPrefix);
        }

        if !trimmed.is_ascii() || trimmed.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(TypesError::InvalidPrefixCharacters(trimmed.to_owned()));
        }

        if trimmed.starts_with(SEPARATOR) || trimmed.ends_with(SEPARATOR) {
            return Err(TypesError::DanglingSeparator(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns a prefix scoped one level deeper, e.g. `originator` + `naturalPerson`.
    pub fn join(&self, child: &Prefix) -> Prefix {
        Prefix(format!("{}{}{}", self.0, SEPARATOR, child.0))
    }

    /// Full field name of `key` inside this scope.
    pub fn field(&self, key: &str) -> String {
        format!("{}{}{}", self.0, SEPARATOR, key)
    }

    /// Strips this scope from a full field name, returning the key inside the scope.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        name.strip_prefix(self.0.as_str())?.strip_prefix(SEPARATOR)
    }

    /// Name of the field carrying a preloaded JSON document for this scope.
    pub fn json_field(&self) -> String {
        format!("{JSON_MARKER}{}", self.0)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Prefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Prefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Prefix {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::new(s)
    }
}

impl serde::Serialize for Prefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for Prefix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Prefix::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A parameter name in the flat transport form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TransportKey {
    /// Plain string parameter.
    Plain(String),
    /// Parameter whose value is JSON text; the marker is not part of the name.
    Json(String),
}

impl TransportKey {
    /// Splits a raw parameter name into its marker and name.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(JSON_MARKER) {
            Some(name) => TransportKey::Json(name.to_owned()),
            None => TransportKey::Plain(raw.to_owned()),
        }
    }

    /// The parameter name with any marker removed.
    pub fn name(&self) -> &str {
        match self {
            TransportKey::Plain(name) | TransportKey::Json(name) => name,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, TransportKey::Json(_))
    }
}

impl std::fmt::Display for TransportKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKey::Plain(name) => write!(f, "{name}"),
            TransportKey::Json(name) => write!(f, "{JSON_MARKER}{name}"),
        }
    }
}
