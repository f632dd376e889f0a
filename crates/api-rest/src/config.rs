//! Server runtime configuration.
//!
//! Configuration is resolved once at process startup and handed to the router inside
//! [`AppState`](crate::AppState). Handlers never read environment variables themselves.

use envoy_forms::{BuildOptions, NumericFallback};
use std::net::SocketAddr;

pub const REST_ADDR_ENV: &str = "ENVOY_REST_ADDR";
pub const STRICT_NUMERIC_ENV: &str = "ENVOY_STRICT_NUMERIC";
pub const STAMP_SENT_AT_ENV: &str = "ENVOY_STAMP_SENT_AT";

pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    #[error("invalid listen address '{value}': {source}")]
    InvalidAddress {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("{name} must be a boolean (true/false/1/0/yes/no), got '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

pub type ServerConfigResult<T> = std::result::Result<T, ServerConfigError>;

/// Server configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    rest_addr: SocketAddr,
    build_options: BuildOptions,
}

impl ServerConfig {
    pub fn new(rest_addr: SocketAddr, build_options: BuildOptions) -> Self {
        Self {
            rest_addr,
            build_options,
        }
    }

    /// Resolve the configuration from raw environment values.
    ///
    /// Each argument is the value of the corresponding `ENVOY_*` variable, if set.
    pub fn from_env_values(
        rest_addr: Option<String>,
        strict_numeric: Option<String>,
        stamp_sent_at: Option<String>,
    ) -> ServerConfigResult<Self> {
        let rest_addr = rest_addr_from_env_value(rest_addr)?;
        let strict = flag_from_env_value(STRICT_NUMERIC_ENV, strict_numeric)?;
        let stamp_sent_at = flag_from_env_value(STAMP_SENT_AT_ENV, stamp_sent_at)?;

        Ok(Self::new(
            rest_addr,
            BuildOptions {
                amount: if strict {
                    NumericFallback::Reject
                } else {
                    NumericFallback::KeepText
                },
                stamp_sent_at,
            },
        ))
    }

    /// Read the `ENVOY_*` variables from the process environment.
    pub fn from_env() -> ServerConfigResult<Self> {
        Self::from_env_values(
            std::env::var(REST_ADDR_ENV).ok(),
            std::env::var(STRICT_NUMERIC_ENV).ok(),
            std::env::var(STAMP_SENT_AT_ENV).ok(),
        )
    }

    pub fn rest_addr(&self) -> SocketAddr {
        self.rest_addr
    }

    /// Default policies for builds that do not override them per request.
    pub fn build_options(&self) -> BuildOptions {
        self.build_options
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse the listen address, falling back to [`DEFAULT_REST_ADDR`] when unset or blank.
pub fn rest_addr_from_env_value(value: Option<String>) -> ServerConfigResult<SocketAddr> {
    let value = non_empty(value).unwrap_or_else(|| DEFAULT_REST_ADDR.to_string());
    value
        .parse()
        .map_err(|source| ServerConfigError::InvalidAddress { value, source })
}

/// Parse a boolean flag. Unset or blank means `false`.
pub fn flag_from_env_value(name: &'static str, value: Option<String>) -> ServerConfigResult<bool> {
    let Some(value) = non_empty(value) else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ServerConfigError::InvalidFlag { name, value }),
    }
}
