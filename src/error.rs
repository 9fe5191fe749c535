//! Crate-owned error types
//!
//! Vendor and filesystem failures are passed through untouched as [`anyhow::Error`];
//! only failures that originate in this crate get a typed variant here.

use thiserror::Error;

/// Configuration could not be assembled from the environment or a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("environment variable {name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{0} must be an http or https URL")]
    UnsupportedScheme(&'static str),
}
