//! `sitekey-core` — Pure primitives for SITEKEY.
//!
//! Site-identity extraction and deterministic per-site password
//! derivation. Zero I/O, zero async, no logging: every function here is
//! a pure computation that is safe to call concurrently.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod memory;

pub mod domain;

pub mod derive;

pub use derive::{
    derive, derive_site_password, is_acceptable, site_seed, Derivation,
    DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, MIN_ROUNDS,
};
pub use domain::{extract, identity_for_host, LOCAL_FILE_IDENTITY};
pub use error::CoreError;
pub use memory::MasterSecret;
