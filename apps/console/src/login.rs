//! Two-factor login sequencer
//!
//! Drives the login conversation against an [`AuthService`]:
//!
//! ```text
//! Idle -> CheckingTwoFactor -> LoggedIn
//!                           -> AwaitingCode <-> Verifying -> LoggedIn
//! ```
//!
//! Any step may end in [`LoginState::Error`], which records the state to
//! return to on [`LoginFlow::dismiss_error`]. The password is retained only
//! while a code is outstanding and is dropped as soon as the flow leaves
//! `AwaitingCode`/`Verifying`.

use casedesk_client::{AuthService, Error as ClientError, TokenPair};
use std::fmt;

use crate::session::Session;

/// Length of the emailed one-time code.
pub const CODE_LENGTH: usize = 6;

pub const INVALID_CREDENTIALS: &str = "Invalid email or password.";
pub const INVALID_CODE: &str = "Invalid or expired verification code.";
pub const MALFORMED_CODE: &str = "Enter the 6-digit code sent to your email.";
pub const CODE_RESENT: &str = "A new verification code has been sent to your email.";

/// Password wrapper whose `Debug` output never shows the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoginState {
    Idle,
    CheckingTwoFactor {
        email: String,
    },
    /// A code has been sent; `notice` carries the outcome of the last
    /// verification or resend attempt.
    AwaitingCode {
        email: String,
        notice: Option<String>,
    },
    Verifying {
        email: String,
    },
    LoggedIn(Session),
    Error {
        message: String,
        resume: Box<LoginState>,
    },
}

impl LoginState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingTwoFactor { .. } => "checking_two_factor",
            Self::AwaitingCode { .. } => "awaiting_code",
            Self::Verifying { .. } => "verifying",
            Self::LoggedIn(_) => "logged_in",
            Self::Error { .. } => "error",
        }
    }

    fn holds_password(&self) -> bool {
        matches!(self, Self::AwaitingCode { .. } | Self::Verifying { .. })
    }
}

#[derive(Debug)]
struct Credentials {
    email: String,
    password: Password,
}

/// Login state machine over an [`AuthService`].
pub struct LoginFlow<A> {
    auth: A,
    fail_open: bool,
    state: LoginState,
    pending: Option<Credentials>,
}

impl<A: AuthService> LoginFlow<A> {
    /// `fail_open` decides what a failed two-factor status check means:
    /// `true` continues with password login, `false` reports the failure.
    pub fn new(auth: A, fail_open: bool) -> Self {
        Self {
            auth,
            fail_open,
            state: LoginState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> &LoginState {
        &self.state
    }

    /// Whether a password is currently retained for the final login step.
    pub fn holds_password(&self) -> bool {
        self.pending.is_some()
    }

    pub fn into_session(self) -> Option<Session> {
        match self.state {
            LoginState::LoggedIn(session) => Some(session),
            _ => None,
        }
    }

    /// Start a login. Ignored unless the flow is `Idle`.
    pub async fn submit_credentials(&mut self, email: &str, password: Password) -> &LoginState {
        if !matches!(self.state, LoginState::Idle) {
            tracing::debug!(state = self.state.name(), "Credentials ignored outside idle state");
            return &self.state;
        }

        let email = email.trim().to_string();
        if email.is_empty() || password.is_empty() {
            self.fail("Email and password are required.", LoginState::Idle);
            return &self.state;
        }

        self.transition(LoginState::CheckingTwoFactor {
            email: email.clone(),
        });

        let enabled = match self.auth.two_factor_enabled(&email).await {
            Ok(enabled) => enabled,
            Err(e) if self.fail_open => {
                tracing::warn!(
                    error = %e,
                    "Two-factor status check failed; continuing with password login"
                );
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Two-factor status check failed");
                let message = format!("Could not check two-factor status: {}", e.display_message());
                self.fail(message, LoginState::Idle);
                return &self.state;
            }
        };

        if !enabled {
            self.complete_login(&email, &password).await;
            return &self.state;
        }

        match self.auth.send_code(&email).await {
            Ok(()) => {
                tracing::info!("Verification code sent");
                self.pending = Some(Credentials {
                    email: email.clone(),
                    password,
                });
                self.transition(LoginState::AwaitingCode {
                    email,
                    notice: None,
                });
            }
            Err(e) => {
                let message = format!("Failed to send verification code: {}", e.display_message());
                self.fail(message, LoginState::Idle);
            }
        }
        &self.state
    }

    /// Verify a one-time code. Ignored unless a code is awaited.
    pub async fn submit_code(&mut self, code: &str) -> &LoginState {
        let LoginState::AwaitingCode { email, .. } = &self.state else {
            tracing::debug!(state = self.state.name(), "Code ignored outside awaiting state");
            return &self.state;
        };
        let email = email.clone();

        let code = code.trim();
        if !is_well_formed_code(code) {
            self.transition(LoginState::AwaitingCode {
                email,
                notice: Some(MALFORMED_CODE.to_string()),
            });
            return &self.state;
        }

        self.transition(LoginState::Verifying {
            email: email.clone(),
        });

        match self.auth.verify_code(&email, code).await {
            Ok(true) => {
                tracing::info!("Verification code accepted");
                match self.pending.take() {
                    Some(credentials) => {
                        self.complete_login(&credentials.email, &credentials.password)
                            .await;
                    }
                    None => self.fail("Login session expired; sign in again.", LoginState::Idle),
                }
            }
            Ok(false) => {
                self.transition(LoginState::AwaitingCode {
                    email,
                    notice: Some(INVALID_CODE.to_string()),
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Code verification failed");
                self.transition(LoginState::AwaitingCode {
                    email,
                    notice: Some(e.display_message()),
                });
            }
        }
        &self.state
    }

    /// Send a fresh code. Ignored unless a code is awaited.
    pub async fn resend_code(&mut self) -> &LoginState {
        let LoginState::AwaitingCode { email, .. } = &self.state else {
            return &self.state;
        };
        let email = email.clone();

        let notice = match self.auth.send_code(&email).await {
            Ok(()) => CODE_RESENT.to_string(),
            Err(e) => format!("Failed to send verification code: {}", e.display_message()),
        };
        self.transition(LoginState::AwaitingCode {
            email,
            notice: Some(notice),
        });
        &self.state
    }

    /// Abandon a pending code and return to `Idle`.
    pub fn back(&mut self) {
        if matches!(
            self.state,
            LoginState::AwaitingCode { .. } | LoginState::Error { .. }
        ) {
            self.transition(LoginState::Idle);
        }
    }

    /// Leave the error state for the state recorded when it was entered.
    pub fn dismiss_error(&mut self) {
        if let LoginState::Error { resume, .. } = &self.state {
            let resume = (**resume).clone();
            self.transition(resume);
        }
    }

    async fn complete_login(&mut self, email: &str, password: &Password) {
        let tokens = match self.auth.login(email, password.expose()).await {
            Ok(tokens) => tokens,
            Err(e) => {
                self.fail(login_failure_message(&e), LoginState::Idle);
                return;
            }
        };

        match self.fetch_session(tokens).await {
            Ok(session) => {
                tracing::info!(user_id = %session.user.id, role = ?session.user.role, "Logged in");
                self.transition(LoginState::LoggedIn(session));
            }
            // Credentials were accepted, so a rejection here is not a bad password.
            Err(e) => self.fail(
                format!("Login failed: {}", e.display_message()),
                LoginState::Idle,
            ),
        }
    }

    async fn fetch_session(&self, tokens: TokenPair) -> casedesk_client::Result<Session> {
        let user = self.auth.current_user(&tokens).await?;
        Ok(Session { tokens, user })
    }

    fn fail(&mut self, message: impl Into<String>, resume: LoginState) {
        let message = message.into();
        tracing::debug!(%message, resume = resume.name(), "Login step failed");
        self.transition(LoginState::Error {
            message,
            resume: Box::new(resume),
        });
    }

    fn transition(&mut self, next: LoginState) {
        tracing::debug!(from = self.state.name(), to = next.name(), "Login state change");
        if !next.holds_password() {
            self.pending = None;
        }
        self.state = next;
    }
}

fn login_failure_message(err: &ClientError) -> String {
    if err.is_unauthorized() {
        INVALID_CREDENTIALS.to_string()
    } else {
        format!("Login failed: {}", err.display_message())
    }
}

/// Exactly six ASCII digits.
pub fn is_well_formed_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_digit())
}
