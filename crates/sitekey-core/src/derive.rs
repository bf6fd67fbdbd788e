//! Deterministic per-site password derivation.
//!
//! The seed `master + pepper + ":" + identity` is hashed repeatedly. Each
//! round replaces the rolling value with the unpadded standard base64
//! encoding of its MD5 digest (22 characters). After every round the first
//! `length` characters are tested against [`is_acceptable`]; derivation
//! stops at the first acceptable candidate once at least [`MIN_ROUNDS`]
//! rounds have run.
//!
//! The digest and encoding are fixed so that outputs stay stable across
//! implementations. This is not a key-derivation function: rounds are
//! fast and unsalted by design of the scheme.

use data_encoding::BASE64_NOPAD;
use md5::{Digest, Md5};
use std::fmt;
use zeroize::Zeroizing;

use crate::error::CoreError;
use crate::memory::MasterSecret;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Rounds that always run before a candidate may be accepted.
pub const MIN_ROUNDS: u32 = 10;

/// Shortest length the acceptance predicate can be satisfied at
/// (a lowercase letter, then a digit and an uppercase letter).
pub const MIN_PASSWORD_LENGTH: usize = 3;

/// Length of one encoded digest; longer passwords cannot be produced.
pub const MAX_PASSWORD_LENGTH: usize = 22;

/// Default password length.
pub const DEFAULT_PASSWORD_LENGTH: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A derived password together with the number of hash rounds it took.
///
/// `Debug` is manually implemented to mask the password, and the buffer is
/// zeroized on drop.
pub struct Derivation {
    password: Zeroizing<String>,
    rounds: u32,
}

impl Derivation {
    /// The derived password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Hash rounds performed (always at least [`MIN_ROUNDS`]).
    #[must_use]
    pub const fn rounds(&self) -> u32 {
        self.rounds
    }

    /// Move the password out, leaving an empty buffer behind.
    #[must_use]
    pub fn into_password(mut self) -> String {
        std::mem::take(&mut *self.password)
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Derivation")
            .field("password", &"***")
            .field("rounds", &self.rounds)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the derivation seed `master + pepper + ":" + identity`.
#[must_use]
pub fn site_seed(master: &str, pepper: &str, identity: &str) -> Zeroizing<String> {
    let capacity = master
        .len()
        .saturating_add(pepper.len())
        .saturating_add(identity.len())
        .saturating_add(1);
    let mut seed = Zeroizing::new(String::with_capacity(capacity));
    seed.push_str(master);
    seed.push_str(pepper);
    seed.push(':');
    seed.push_str(identity);
    seed
}

/// One hash round: unpadded base64 of the MD5 digest of `value`.
#[must_use]
pub fn digest_round(value: &str) -> String {
    BASE64_NOPAD.encode(Md5::digest(value.as_bytes()).as_slice())
}

/// Acceptance predicate for a candidate password.
///
/// The first lowercase letter must be at index 0, and the first digit and
/// the first uppercase letter must each appear at some index > 0.
#[must_use]
pub fn is_acceptable(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    let first_lower = bytes.iter().position(u8::is_ascii_lowercase);
    let first_digit = bytes.iter().position(u8::is_ascii_digit);
    let first_upper = bytes.iter().position(u8::is_ascii_uppercase);

    first_lower == Some(0)
        && first_digit.is_some_and(|i| i > 0)
        && first_upper.is_some_and(|i| i > 0)
}

/// Derive a password of `length` characters from `seed`.
///
/// # Errors
///
/// Returns [`CoreError::InvalidConfig`] if `length` is outside
/// [`MIN_PASSWORD_LENGTH`]..=[`MAX_PASSWORD_LENGTH`].
pub fn derive(seed: &str, length: usize) -> Result<Derivation, CoreError> {
    if !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        return Err(CoreError::InvalidConfig(format!(
            "password length must be between {MIN_PASSWORD_LENGTH} and {MAX_PASSWORD_LENGTH}, got {length}"
        )));
    }

    let mut rolling = Zeroizing::new(seed.to_owned());
    let mut rounds: u32 = 0;
    loop {
        rolling = Zeroizing::new(digest_round(&rolling));
        rounds = rounds.saturating_add(1);

        // Encoded digests are ASCII, so any prefix is a char boundary.
        let candidate = rolling.get(..length).unwrap_or(rolling.as_str());
        if rounds >= MIN_ROUNDS && is_acceptable(candidate) {
            return Ok(Derivation {
                password: Zeroizing::new(candidate.to_owned()),
                rounds,
            });
        }
    }
}

/// Derive the password for `identity` from the session secret and the
/// configured pepper.
///
/// # Errors
///
/// Returns [`CoreError::InvalidConfig`] if `length` is out of range.
pub fn derive_site_password(
    master: &MasterSecret,
    pepper: &str,
    identity: &str,
    length: usize,
) -> Result<Derivation, CoreError> {
    let seed = site_seed(master.expose(), pepper, identity);
    derive(&seed, length)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_layout() {
        let seed = site_seed("master", "pepper", "example.com");
        assert_eq!(seed.as_str(), "masterpepper:example.com");
        let seed = site_seed("master", "", "example.com");
        assert_eq!(seed.as_str(), "master:example.com");
    }

    #[test]
    fn digest_round_known_answer() {
        assert_eq!(digest_round("abc"), "kAFQmDzST7DWlj99KOF/cg");
        assert_eq!(digest_round("hunter2:example.com"), "/VxEFgxSAmhL8NjBUmEW5w");
    }

    #[test]
    fn digest_round_is_22_chars() {
        for input in ["", "a", "a much longer input value with spaces"] {
            assert_eq!(digest_round(input).len(), MAX_PASSWORD_LENGTH);
        }
    }

    #[test]
    fn predicate_requires_leading_lowercase() {
        assert!(is_acceptable("a1B"));
        assert!(!is_acceptable("A1b"));
        assert!(!is_acceptable("1aB"));
        assert!(!is_acceptable("+a1B"));
    }

    #[test]
    fn predicate_requires_digit_and_uppercase_after_start() {
        assert!(!is_acceptable("abc"));
        assert!(!is_acceptable("ab1"));
        assert!(!is_acceptable("abC"));
        assert!(is_acceptable("abc+/9xyzQ"));
    }

    #[test]
    fn predicate_empty_and_short() {
        assert!(!is_acceptable(""));
        assert!(!is_acceptable("a"));
        assert!(!is_acceptable("a1"));
    }

    #[test]
    fn known_answer_vectors() {
        let cases = [
            ("correct horse", "", "example.com", 10, "hfet3nG8e6", 16),
            ("correct horse", "pepper", "example.com", 10, "v4Ng+rnUrn", 11),
            ("correct horse", "", "example.com", 16, "kmFsIwsYaGN56uuL", 13),
            ("correct horse", "", "example.co.uk", 10, "aLJo/G0L0p", 12),
            ("hunter2", "", "localhost", 3, "kH7", 15),
            ("hunter2", "salt", "192.168.1.1", 22, "nKF8Dh4pn1o4ZwPo0KVRvA", 10),
            ("", "", "example.com", 10, "bH3cSzfobK", 11),
            ("pässwörd", "", "example.com", 10, "oPui3zehi4", 10),
        ];
        for (master, pepper, identity, len, expected, rounds) in cases {
            let seed = site_seed(master, pepper, identity);
            let d = derive(&seed, len).unwrap();
            assert_eq!(d.password(), expected, "seed {:?}", seed.as_str());
            assert_eq!(d.rounds(), rounds, "seed {:?}", seed.as_str());
        }
    }

    #[test]
    fn early_acceptable_round_is_skipped() {
        // Round 2 of this seed already passes the predicate.
        let second = digest_round(&digest_round("hunter2:example.com"));
        assert!(is_acceptable(&second[..10]));

        let d = derive("hunter2:example.com", 10).unwrap();
        assert_eq!(d.rounds(), 11);
        assert_eq!(d.password(), "ojrI1FqJuo");
    }

    #[test]
    fn length_out_of_range_rejected() {
        for len in [0, 1, 2, MAX_PASSWORD_LENGTH + 1, 64] {
            let err = derive("seed", len).unwrap_err();
            assert!(matches!(err, CoreError::InvalidConfig(_)), "len {len}");
            assert!(err.to_string().contains("password length must be between"));
        }
    }

    #[test]
    fn site_password_matches_manual_seed() {
        let master = MasterSecret::from("correct horse");
        let d = derive_site_password(&master, "pepper", "example.com", 10).unwrap();
        assert_eq!(d.password(), "v4Ng+rnUrn");
    }

    #[test]
    fn into_password_moves_value() {
        let d = derive("hunter2:example.com", 10).unwrap();
        assert_eq!(d.into_password(), "ojrI1FqJuo");
    }

    #[test]
    fn debug_is_masked() {
        let d = derive("hunter2:example.com", 10).unwrap();
        let debug = format!("{d:?}");
        assert!(!debug.contains("ojrI1FqJuo"));
        assert!(debug.contains("rounds: 11"));
    }
}
