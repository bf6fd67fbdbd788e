//! Error types for `sitekey-core`.

use thiserror::Error;

/// Errors produced by site-identity extraction and password derivation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The page URL could not be parsed, or it has no host to derive a
    /// site identity from.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Derivation parameters are out of range (password length).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
