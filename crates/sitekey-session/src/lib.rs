//! `sitekey-session` — Session coordination and request routing for SITEKEY.
//!
//! Holds the master secret of an unlocked session, drives the single
//! unlock prompt, persists user options, and answers page requests with
//! passwords derived by `sitekey-core`.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;
pub mod prompt;

pub mod coordinator;

pub mod options;

pub mod messages;

pub mod router;

pub use coordinator::{SessionCoordinator, SessionStatus};
pub use error::SessionError;
pub use messages::{Request, Response};
pub use options::{
    FileOptionsStore, MemoryOptionsStore, Options, OptionsProvider, DEFAULT_LENGTH,
    DEFAULT_SECRET,
};
pub use prompt::{ChannelPrompt, PromptEvent, PromptHandle, UnlockPrompt};
pub use router::{GeneratedPassword, RequestRouter};
