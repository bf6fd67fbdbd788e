#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Property-based tests for site-identity extraction.

use proptest::prelude::*;
use sitekey_core::domain::{extract, suffixes};

/// Strategy for a DNS label.
fn label() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,10}"
}

/// Strategy for a plain (single-label) TLD that is never part of a
/// multi-level table entry on its own.
fn plain_tld() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("com"), Just("org"), Just("net"), Just("dev"), Just("io")]
}

/// Strategy for an entry of the multi-level table.
fn multi_level_suffix() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(suffixes::multi_level_suffixes().to_vec())
}

proptest! {
    /// Subdomains, paths, and queries never change the identity.
    #[test]
    fn subdomains_share_identity(
        name in label(),
        tld in plain_tld(),
        subs in proptest::collection::vec(label(), 0..4),
        path in "[a-z0-9/]{0,20}",
    ) {
        let base = format!("{name}.{tld}");
        let mut host = base.clone();
        for sub in &subs {
            host = format!("{sub}.{host}");
        }
        let id = extract(&format!("https://{host}/{path}?q=1")).unwrap();
        prop_assert_eq!(id, base);
    }

    /// A multi-level suffix keeps exactly one label in front of it.
    #[test]
    fn multi_level_suffix_keeps_one_label(
        name in label(),
        suffix in multi_level_suffix(),
        sub in label(),
    ) {
        let url = format!("https://{sub}.{name}.{suffix}/");
        let id = extract(&url).unwrap();
        // A longer table entry may swallow `name` itself; the identity
        // still ends with the suffix and never includes `sub` twice.
        prop_assert!(id.ends_with(suffix), "{} does not end with {}", id, suffix);
        prop_assert!(id.split('.').count() > suffix.split('.').count());
    }

    /// Different registrable names under the same TLD never collide.
    #[test]
    fn distinct_names_are_isolated(
        a in label(),
        b in label(),
        tld in plain_tld(),
    ) {
        prop_assume!(a != b);
        let id_a = extract(&format!("https://www.{a}.{tld}/")).unwrap();
        let id_b = extract(&format!("https://www.{b}.{tld}/")).unwrap();
        prop_assert_ne!(id_a, id_b);
    }

    /// IPv4 hosts are returned verbatim.
    #[test]
    fn ipv4_is_verbatim(a in 0u8..=255, b in 0u8..=255, c in 0u8..=255, d in 0u8..=255) {
        let ip = format!("{a}.{b}.{c}.{d}");
        prop_assert_eq!(extract(&format!("http://{ip}/")).unwrap(), ip);
    }
}
