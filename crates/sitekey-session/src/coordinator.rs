//! Master-secret session coordinator.
//!
//! Owns the master secret of an unlocked session and the single unlock
//! prompt. State is held behind a `Mutex<SessionState>` that is never held
//! across an `.await`:
//! - `Locked`: no secret, no prompt
//! - `AwaitingInput`: one prompt open, zero or more callers queued behind it
//! - `Unlocked`: secret held, callers served immediately
//!
//! Each queued caller waits on a `oneshot` receiver. Submitting the secret
//! sends it to every queued sender at once; dismissing the prompt (or
//! locking) drops every sender, which each waiting caller observes as
//! [`SessionError::PromptDismissed`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use sitekey_core::MasterSecret;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::error::SessionError;
use crate::prompt::{PromptHandle, UnlockPrompt};

type Waiter = oneshot::Sender<MasterSecret>;

enum SessionState {
    Locked,
    AwaitingInput {
        handle: PromptHandle,
        waiters: Vec<Waiter>,
    },
    Unlocked(MasterSecret),
}

/// Observable session state (no secret material).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No master secret held, no prompt open.
    Locked,
    /// Prompt open with `pending` callers queued behind it.
    AwaitingInput {
        /// Open prompt.
        handle: PromptHandle,
        /// Callers waiting for the outcome.
        pending: usize,
    },
    /// Master secret held.
    Unlocked,
}

/// Coordinates access to the master secret for concurrent requests.
///
/// One instance per session. Dropping the coordinator rejects every queued
/// caller and wipes the held secret once no derivation still uses it.
pub struct SessionCoordinator<P> {
    prompt: P,
    state: Mutex<SessionState>,
}

impl<P: UnlockPrompt> SessionCoordinator<P> {
    /// Create a locked coordinator that shows prompts through `prompt`.
    pub const fn new(prompt: P) -> Self {
        Self {
            prompt,
            state: Mutex::new(SessionState::Locked),
        }
    }

    /// The prompt capability this coordinator drives.
    pub const fn prompt(&self) -> &P {
        &self.prompt
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current state, without secret material.
    pub fn status(&self) -> SessionStatus {
        match &*self.lock_state() {
            SessionState::Locked => SessionStatus::Locked,
            SessionState::AwaitingInput { handle, waiters } => SessionStatus::AwaitingInput {
                handle: *handle,
                pending: waiters.len(),
            },
            SessionState::Unlocked(_) => SessionStatus::Unlocked,
        }
    }

    /// Obtain the master secret, prompting the user if the session is locked.
    ///
    /// Only the first caller of an episode opens the prompt; later callers
    /// queue behind it and re-focus it.
    ///
    /// # Errors
    ///
    /// - [`SessionError::PromptDismissed`] if the prompt is closed without
    ///   input, or the session is locked while this caller waits
    /// - [`SessionError::PromptUnavailable`] if the prompt cannot be shown
    pub async fn get_secret(&self) -> Result<MasterSecret, SessionError> {
        let receiver = {
            let mut state = self.lock_state();
            let (sender, receiver) = oneshot::channel();
            match &mut *state {
                SessionState::Unlocked(secret) => {
                    debug!("master secret available");
                    return Ok(secret.clone());
                }
                SessionState::AwaitingInput { handle, waiters } => {
                    waiters.push(sender);
                    debug!(
                        handle = handle.id(),
                        pending = waiters.len(),
                        "unlock prompt already open; request queued"
                    );
                    self.prompt.focus(*handle);
                }
                SessionState::Locked => {
                    let handle = match self.prompt.open() {
                        Ok(handle) => handle,
                        Err(e) => {
                            warn!("unlock prompt could not be shown: {e}");
                            return Err(e);
                        }
                    };
                    debug!(handle = handle.id(), "unlock prompt opened");
                    *state = SessionState::AwaitingInput {
                        handle,
                        waiters: vec![sender],
                    };
                }
            }
            receiver
        };

        receiver.await.map_err(|_| SessionError::PromptDismissed)
    }

    /// Store the master secret entered by the user and resolve every queued
    /// caller with it.
    ///
    /// Also accepted without an open prompt, in which case it simply
    /// unlocks (or replaces the secret of) the session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptySecret`] for an empty value; the state
    /// and any open prompt are left untouched.
    pub fn submit_secret(&self, value: String) -> Result<(), SessionError> {
        if value.is_empty() {
            warn!("empty master password rejected");
            return Err(SessionError::EmptySecret);
        }
        let secret = MasterSecret::new(value);

        let previous = std::mem::replace(
            &mut *self.lock_state(),
            SessionState::Unlocked(secret.clone()),
        );

        match previous {
            SessionState::AwaitingInput { handle, waiters } => {
                info!(pending = waiters.len(), "master password set; resolving queued requests");
                for waiter in waiters {
                    if waiter.send(secret.clone()).is_err() {
                        debug!("requester went away before unlock");
                    }
                }
                self.prompt.close(handle);
            }
            SessionState::Locked => info!("master password set"),
            SessionState::Unlocked(_) => info!("master password replaced"),
        }
        Ok(())
    }

    /// Window-layer notification that the prompt identified by `handle`
    /// was closed by the user.
    ///
    /// Rejects every queued caller and returns to `Locked`. Stale handles
    /// (a prompt already resolved or cancelled) are ignored.
    pub fn prompt_closed(&self, handle: PromptHandle) {
        let rejected = {
            let mut state = self.lock_state();
            match &*state {
                SessionState::AwaitingInput { handle: open, .. } if *open == handle => {}
                _ => {
                    debug!(handle = handle.id(), "ignoring close of inactive prompt");
                    return;
                }
            }
            take_pending(&mut state)
        };

        if let Some((_, waiters)) = rejected {
            info!(rejected = waiters.len(), "unlock prompt dismissed; rejecting queued requests");
        }
    }

    /// Explicit cancel from the prompt: close it and reject every queued
    /// caller.
    pub fn cancel(&self) {
        let pending = take_pending(&mut self.lock_state());
        match pending {
            Some((handle, waiters)) => {
                info!(rejected = waiters.len(), "unlock prompt cancelled; rejecting queued requests");
                drop(waiters);
                self.prompt.close(handle);
            }
            None => debug!("cancel received without an open prompt"),
        }
    }

    /// Forget the master secret and close any open prompt. Idempotent.
    pub fn lock(&self) {
        let previous = std::mem::replace(&mut *self.lock_state(), SessionState::Locked);
        match previous {
            SessionState::Unlocked(_) => info!("session locked; master password cleared"),
            SessionState::AwaitingInput { handle, waiters } => {
                info!(rejected = waiters.len(), "session locked while unlock prompt open");
                drop(waiters);
                self.prompt.close(handle);
            }
            SessionState::Locked => debug!("session already locked"),
        }
    }
}

/// Move an open episode out of `state`, leaving `Locked` behind. Other
/// states are left untouched.
fn take_pending(state: &mut SessionState) -> Option<(PromptHandle, Vec<Waiter>)> {
    match std::mem::replace(state, SessionState::Locked) {
        SessionState::AwaitingInput { handle, waiters } => Some((handle, waiters)),
        other => {
            *state = other;
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
