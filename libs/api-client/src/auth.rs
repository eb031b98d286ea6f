//! Auth service: two-factor endpoints, token login, current user and
//! password maintenance

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    client::ApiClient,
    error::{Error, Result},
    models::{ProfileUpdate, Role},
    records::ActionReceipt,
};

/// Shortest password the backend accepts.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Access/refresh token pair issued by `/api/login/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Profile of the logged-in user as returned by `/api/me/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub two_factor_enabled: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// Auth/session collaborator consumed by the login sequencer.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Whether two-factor login is enabled for `email`. Unknown emails
    /// report `false`.
    async fn two_factor_enabled(&self, email: &str) -> Result<bool>;

    /// Email a fresh one-time code to `email`.
    async fn send_code(&self, email: &str) -> Result<()>;

    /// `Ok(false)` when the code is wrong or expired.
    async fn verify_code(&self, email: &str, code: &str) -> Result<bool>;

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair>;

    async fn current_user(&self, tokens: &TokenPair) -> Result<CurrentUser>;

    /// Revoke the refresh token.
    async fn logout(&self, tokens: &TokenPair) -> Result<()>;

    /// Email a password-reset token to `email`. Unknown emails are rejected.
    async fn forgot_password(&self, email: &str) -> Result<ActionReceipt>;

    /// Set a new password using the token from the reset email.
    async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<ActionReceipt>;

    /// Change the logged-in user's password.
    async fn change_password(
        &self,
        tokens: &TokenPair,
        old_password: &str,
        new_password: &str,
    ) -> Result<ActionReceipt>;

    /// Update the logged-in user's own name, email, phone or two-factor flag.
    /// The backend echoes only the edited fields; re-read the profile with
    /// [`AuthService::current_user`] afterwards.
    async fn update_profile(
        &self,
        tokens: &TokenPair,
        update: &ProfileUpdate,
    ) -> Result<ActionReceipt>;
}

#[derive(Deserialize)]
struct TwoFactorStatus {
    #[serde(default)]
    two_factor_enabled: bool,
}

#[derive(Deserialize)]
struct Verification {
    #[serde(default)]
    verified: bool,
}

#[async_trait]
impl AuthService for ApiClient {
    async fn two_factor_enabled(&self, email: &str) -> Result<bool> {
        let status: TwoFactorStatus = self
            .post_json("api/v1/users/2fa/check-enabled/", &json!({ "email": email }))
            .await?;
        Ok(status.two_factor_enabled)
    }

    async fn send_code(&self, email: &str) -> Result<()> {
        let _: serde_json::Value = self
            .post_json("api/v1/users/2fa/send-code/", &json!({ "email": email }))
            .await?;
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> Result<bool> {
        let result: Result<Verification> = self
            .post_json(
                "api/v1/users/2fa/verify-code/",
                &json!({ "email": email, "code": code }),
            )
            .await;
        match result {
            Ok(v) => Ok(v.verified),
            // A rejected code is answered with 400 and `verified: false`.
            Err(Error::Api { status: 400, .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn login(&self, email: &str, password: &str) -> Result<TokenPair> {
        self.post_json(
            "api/login/",
            &json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn current_user(&self, tokens: &TokenPair) -> Result<CurrentUser> {
        let url = self.endpoint("api/me/")?;
        self.clone().with_token(&tokens.access).get_json(url).await
    }

    async fn logout(&self, tokens: &TokenPair) -> Result<()> {
        let _: serde_json::Value = self
            .clone()
            .with_token(&tokens.access)
            .post_json("api/logout/", &json!({ "refresh": tokens.refresh }))
            .await?;
        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> Result<ActionReceipt> {
        tracing::info!("Requesting password reset email");
        self.post_json("api/v1/users/forgot-password/", &json!({ "email": email }))
            .await
    }

    async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<ActionReceipt> {
        self.post_json(
            "api/v1/users/reset-password/",
            &json!({
                "email": email,
                "token": token,
                "new_password": new_password,
                "new_password_confirm": new_password,
            }),
        )
        .await
    }

    async fn change_password(
        &self,
        tokens: &TokenPair,
        old_password: &str,
        new_password: &str,
    ) -> Result<ActionReceipt> {
        self.clone()
            .with_token(&tokens.access)
            .post_json(
                "api/v1/users/profile/change-password/",
                &json!({
                    "old_password": old_password,
                    "new_password": new_password,
                    "new_password_confirm": new_password,
                }),
            )
            .await
    }

    async fn update_profile(
        &self,
        tokens: &TokenPair,
        update: &ProfileUpdate,
    ) -> Result<ActionReceipt> {
        self.clone()
            .with_token(&tokens.access)
            .patch_json("api/v1/users/profile/update/", update)
            .await
    }
}
