//! Session error types for `sitekey-session`.

use sitekey_core::CoreError;
use thiserror::Error;

/// Errors produced while serving password requests.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Identity extraction or derivation failed (delegated from core).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The user closed the unlock prompt without entering the master
    /// password. Every request queued behind the prompt receives this.
    #[error("master password prompt dismissed")]
    PromptDismissed,

    /// The unlock prompt could not be shown.
    #[error("unlock prompt unavailable: {0}")]
    PromptUnavailable(String),

    /// An empty master password was submitted.
    #[error("master password must not be empty")]
    EmptySecret,

    /// Options could not be read, validated, or written.
    #[error("options error: {0}")]
    Options(String),

    /// An inbound message could not be decoded or a response encoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error from the filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
