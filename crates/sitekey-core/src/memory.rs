//! In-memory holder for the master secret.
//!
//! [`MasterSecret`] wraps a [`SecretString`] from the `secrecy` crate and adds:
//! - Cheap read-only sharing (`Clone` bumps a reference count, it never
//!   copies the plaintext)
//! - Masked `Debug`/`Display` output to prevent accidental leakage
//! - Zeroization of the backing memory when the last clone drops

use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;

/// The user's master secret for an unlocked session.
///
/// Never serialized and never written to durable storage. Every
/// concurrent derivation holds its own clone; the plaintext is wiped once
/// the session has been locked and the last in-flight derivation finished.
#[derive(Clone)]
pub struct MasterSecret {
    inner: Arc<SecretString>,
}

impl MasterSecret {
    /// Take ownership of `value` as the master secret.
    ///
    /// The string is moved into a zeroize-on-drop allocation; no other
    /// copy is made.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            inner: Arc::new(SecretString::from(value)),
        }
    }

    /// Expose the plaintext. Keep exposure minimal: use the slice within a
    /// single expression rather than binding it to a long-lived variable.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Length of the secret in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.expose().len()
    }

    /// Returns `true` if the secret is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if both handles share the same allocation.
    #[must_use]
    pub fn shares_allocation(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<String> for MasterSecret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for MasterSecret {
    fn from(value: &str) -> Self {
        Self::new(value.to_owned())
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(***)")
    }
}

impl fmt::Display for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(***)")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
