//! # Envoy Forms
//!
//! Maps flat form submissions onto the nested JSON documents exchanged by a travel rule
//! back office (IVMS101 identities, transactions, and the envelope that carries both).
//!
//! Form fields encode their position in the document with underscore-delimited names:
//! `originator_naturalPerson_geographicAddress_0_addressLine_1` lands in the second address
//! line of the first address of the originator's natural person.
//!
//! This crate contains:
//! - [`FormData`]: the ordered multi-map of submitted fields
//! - [`PrefixReader`]: a prefix-scoped view over a form
//! - [`path`]: the declarative tokenizer/assigner that turns field names into document paths
//! - [`builders`]: per-entity document builders ([`NaturalPerson`], [`LegalPerson`],
//!   [`Transaction`], [`Envelope`], [`Prepare`])
//! - [`transport`]: conversion to and from the `json:`-tagged transport form
//! - [`choices`]: IVMS101 code lists for select inputs
//!
//! **No HTTP concerns**: request handling belongs in `api-rest`.

pub mod builders;
pub mod choices;
pub mod form_data;
pub mod path;
pub mod reader;
pub mod transport;

pub use builders::{
    BuildOptions, DocumentBuilder, Envelope, LegalPerson, NaturalPerson, Prepare, Transaction,
    Vocabulary,
};
pub use form_data::{FieldEntry, FormData};
pub use path::NumericFallback;
pub use reader::{FormInput, PrefixReader};

// Re-export the shared primitives so callers only need this crate.
pub use envoy_types::{Prefix, TransportKey, JSON_MARKER};

/// Errors returned while reading forms and building documents.
#[derive(Debug, thiserror::Error)]
pub enum FormsError {
    #[error("invalid input kind: {0}")]
    InvalidInputKind(String),

    #[error("invalid JSON in field '{key}': {source}")]
    InvalidJson {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("field '{field}' must be numeric, got '{value}'")]
    MalformedNumeric { field: String, value: String },

    #[error("invalid prefix: {0}")]
    InvalidPrefix(#[from] envoy_types::TypesError),

    #[error("invalid form encoding: {0}")]
    InvalidEncoding(String),

    #[error("failed to serialise document: {0}")]
    Serialization(serde_json::Error),
}

/// Type alias for Results that can fail with a [`FormsError`].
pub type FormsResult<T> = std::result::Result<T, FormsError>;
