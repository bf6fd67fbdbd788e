//! Unlock prompt seam.
//!
//! The coordinator never touches a window system. It asks an
//! [`UnlockPrompt`] to show, focus, or close the master-password prompt,
//! and learns the outcome through
//! [`SessionCoordinator::submit_secret`](crate::coordinator::SessionCoordinator::submit_secret)
//! and
//! [`SessionCoordinator::prompt_closed`](crate::coordinator::SessionCoordinator::prompt_closed).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::error::SessionError;

/// Identifies one shown prompt. Close events carrying a handle other than
/// the currently open one are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PromptHandle(u64);

impl PromptHandle {
    /// Wrap a window-system identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The wrapped identifier.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Capability to show the master-password prompt.
///
/// Methods are called while the coordinator holds its state lock, so
/// implementations must not call back into the coordinator synchronously.
/// Dismissal is reported later through `prompt_closed`.
pub trait UnlockPrompt: Send + Sync {
    /// Show the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PromptUnavailable`] if the prompt cannot be shown.
    fn open(&self) -> Result<PromptHandle, SessionError>;

    /// Draw the user's attention back to an already open prompt.
    fn focus(&self, _handle: PromptHandle) {}

    /// Close the prompt.
    fn close(&self, handle: PromptHandle);
}

impl<T: UnlockPrompt + ?Sized> UnlockPrompt for Arc<T> {
    fn open(&self) -> Result<PromptHandle, SessionError> {
        (**self).open()
    }

    fn focus(&self, handle: PromptHandle) {
        (**self).focus(handle);
    }

    fn close(&self, handle: PromptHandle) {
        (**self).close(handle);
    }
}

// ── Channel-backed prompt ──────────────────────────────────────────

/// Prompt lifecycle event forwarded by [`ChannelPrompt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptEvent {
    /// Show a new prompt.
    Open(PromptHandle),
    /// Regain attention for the open prompt.
    Focus(PromptHandle),
    /// Close the prompt.
    Close(PromptHandle),
}

/// [`UnlockPrompt`] that forwards lifecycle events to a UI task over an
/// unbounded channel. Handles are allocated sequentially from 1.
#[derive(Debug)]
pub struct ChannelPrompt {
    events: mpsc::UnboundedSender<PromptEvent>,
    next_id: AtomicU64,
}

impl ChannelPrompt {
    /// Create a prompt and the receiver the UI task should drain.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PromptEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let prompt = Self {
            events,
            next_id: AtomicU64::new(1),
        };
        (prompt, rx)
    }
}

impl UnlockPrompt for ChannelPrompt {
    fn open(&self) -> Result<PromptHandle, SessionError> {
        let handle = PromptHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.events
            .send(PromptEvent::Open(handle))
            .map_err(|_| SessionError::PromptUnavailable("prompt receiver closed".into()))?;
        Ok(handle)
    }

    fn focus(&self, handle: PromptHandle) {
        if self.events.send(PromptEvent::Focus(handle)).is_err() {
            debug!(handle = handle.id(), "prompt receiver closed; focus dropped");
        }
    }

    fn close(&self, handle: PromptHandle) {
        if self.events.send(PromptEvent::Close(handle)).is_err() {
            debug!(handle = handle.id(), "prompt receiver closed; close dropped");
        }
    }
}
