//! Wire messages exchanged with the page, prompt, and options views.
//!
//! Messages are JSON objects tagged by `"type"` in kebab-case. Unknown
//! fields are ignored (pages send extras such as `tabId`).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::options::Options;

/// Inbound message.
///
/// `Debug` is manually implemented to mask the master password.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Request {
    /// Derive the password for the page at `url`.
    GeneratePassword {
        /// Page URL.
        url: String,
    },
    /// Lock the session.
    ClearMasterPassword,
    /// Master password entered in the prompt.
    SetMasterPassword {
        /// The master password.
        password: String,
    },
    /// Prompt closed via its cancel action.
    Cancel,
    /// Read the current options.
    GetOptions,
    /// Replace the options.
    UpdateOptions(Options),
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GeneratePassword { url } => f
                .debug_struct("GeneratePassword")
                .field("url", url)
                .finish(),
            Self::ClearMasterPassword => f.write_str("ClearMasterPassword"),
            Self::SetMasterPassword { .. } => f
                .debug_struct("SetMasterPassword")
                .field("password", &"***")
                .finish(),
            Self::Cancel => f.write_str("Cancel"),
            Self::GetOptions => f.write_str("GetOptions"),
            Self::UpdateOptions(options) => {
                f.debug_tuple("UpdateOptions").field(options).finish()
            }
        }
    }
}

impl Request {
    /// Message type as it appears on the wire, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::GeneratePassword { .. } => "generate-password",
            Self::ClearMasterPassword => "clear-master-password",
            Self::SetMasterPassword { .. } => "set-master-password",
            Self::Cancel => "cancel",
            Self::GetOptions => "get-options",
            Self::UpdateOptions(_) => "update-options",
        }
    }

    /// Decode a JSON message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] for malformed JSON or an unknown
    /// message type.
    pub fn from_json(raw: &str) -> Result<Self, SessionError> {
        serde_json::from_str(raw).map_err(|e| SessionError::Protocol(e.to_string()))
    }
}

/// Outbound message.
///
/// `Debug` is manually implemented to mask the derived password and the
/// site pepper.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Response {
    /// Derived password for a `generate-password` request.
    Password {
        /// Site identity the password was derived for.
        identity: String,
        /// The derived password.
        password: String,
    },
    /// A `generate-password` request failed.
    PasswordNotAvailable {
        /// Human-readable reason.
        error: String,
    },
    /// Reply to `get-options`.
    Options(Options),
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password { identity, .. } => f
                .debug_struct("Password")
                .field("identity", identity)
                .field("password", &"***")
                .finish(),
            Self::PasswordNotAvailable { error } => f
                .debug_struct("PasswordNotAvailable")
                .field("error", error)
                .finish(),
            Self::Options(options) => f.debug_tuple("Options").field(options).finish(),
        }
    }
}

impl Response {
    /// Encode as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] if serialization fails.
    pub fn to_json(&self) -> Result<String, SessionError> {
        serde_json::to_string(self).map_err(|e| SessionError::Protocol(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
