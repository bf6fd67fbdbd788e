//! Request routing: one entry point per inbound message.
//!
//! A `generate-password` request waits for the master secret and the
//! options concurrently, then extracts the site identity and derives the
//! password. Any failure fails the whole request; no fallback password is
//! ever produced.

use std::fmt;

use sitekey_core::{derive, domain};
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::coordinator::SessionCoordinator;
use crate::error::SessionError;
use crate::messages::{Request, Response};
use crate::options::{Options, OptionsProvider};
use crate::prompt::UnlockPrompt;

/// A derived password and the identity it belongs to.
///
/// `Debug` is manually implemented to mask the password, and the buffer is
/// zeroized on drop.
pub struct GeneratedPassword {
    /// Site identity used as the derivation salt.
    pub identity: String,
    /// The derived password.
    pub password: Zeroizing<String>,
}

impl fmt::Debug for GeneratedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedPassword")
            .field("identity", &self.identity)
            .field("password", &"***")
            .finish()
    }
}

/// Serves requests against one session and one options source.
pub struct RequestRouter<P, O> {
    session: SessionCoordinator<P>,
    options: O,
}

impl<P: UnlockPrompt, O: OptionsProvider> RequestRouter<P, O> {
    /// Route requests to `session`, reading options from `options`.
    pub const fn new(session: SessionCoordinator<P>, options: O) -> Self {
        Self { session, options }
    }

    /// The session coordinator (for prompt close notifications).
    pub const fn session(&self) -> &SessionCoordinator<P> {
        &self.session
    }

    /// Derive the password for the page at `url`.
    ///
    /// # Errors
    ///
    /// - [`SessionError::PromptDismissed`] / [`SessionError::PromptUnavailable`]
    ///   if the master secret could not be obtained
    /// - [`SessionError::Core`] for an invalid URL or invalid options
    /// - any error of the options provider
    pub async fn generate_password(&self, url: &str) -> Result<GeneratedPassword, SessionError> {
        let (secret, options) =
            tokio::try_join!(self.session.get_secret(), self.options.load())?;

        let identity = domain::extract(url)?;
        debug!(identity = %identity, "generating password");

        let derivation =
            derive::derive_site_password(&secret, &options.secret, &identity, options.len)?;
        debug!(identity = %identity, rounds = derivation.rounds(), "password derived");

        Ok(GeneratedPassword {
            identity,
            password: Zeroizing::new(derivation.into_password()),
        })
    }

    /// Current options.
    ///
    /// # Errors
    ///
    /// Propagates the options provider's error.
    pub async fn options(&self) -> Result<Options, SessionError> {
        self.options.load().await
    }

    /// Validate and store new options.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Core`] for an out-of-range length, or the
    /// options provider's error.
    pub async fn update_options(&self, options: Options) -> Result<(), SessionError> {
        options.validate()?;
        self.options.store(options).await
    }

    /// Dispatch one inbound message.
    ///
    /// Returns the reply to send back, if the message type has one. A
    /// failed `generate-password` is answered with
    /// [`Response::PasswordNotAvailable`] rather than an `Err`.
    ///
    /// # Errors
    ///
    /// Errors of the other message types (empty master password, invalid
    /// options, options I/O) are returned to the caller.
    pub async fn handle(&self, request: Request) -> Result<Option<Response>, SessionError> {
        debug!(kind = request.kind(), "received message");
        match request {
            Request::GeneratePassword { url } => {
                let response = match self.generate_password(&url).await {
                    Ok(mut generated) => Response::Password {
                        identity: std::mem::take(&mut generated.identity),
                        password: std::mem::take(&mut *generated.password),
                    },
                    Err(e) => {
                        warn!("password not available: {e}");
                        Response::PasswordNotAvailable {
                            error: e.to_string(),
                        }
                    }
                };
                Ok(Some(response))
            }
            Request::ClearMasterPassword => {
                self.session.lock();
                Ok(None)
            }
            Request::SetMasterPassword { password } => {
                self.session.submit_secret(password)?;
                Ok(None)
            }
            Request::Cancel => {
                self.session.cancel();
                Ok(None)
            }
            Request::GetOptions => Ok(Some(Response::Options(self.options().await?))),
            Request::UpdateOptions(options) => {
                self.update_options(options).await?;
                Ok(None)
            }
        }
    }

    /// Decode a JSON message, dispatch it, and encode the reply.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Protocol`] for an undecodable message, or
    /// the error of [`handle`](Self::handle).
    pub async fn handle_json(&self, raw: &str) -> Result<Option<String>, SessionError> {
        let request = Request::from_json(raw)?;
        self.handle(request)
            .await?
            .map(|response| response.to_json())
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
