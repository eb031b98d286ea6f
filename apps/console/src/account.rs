//! Account maintenance: password reset and change, profile edits

use casedesk_client::{AuthService, ProfileUpdate, MIN_PASSWORD_LENGTH};

use crate::error::{Error, Result};
use crate::login::Password;
use crate::session::Session;

pub const RESET_EMAIL_SENT: &str = "Password reset email sent. Please check your email.";
pub const PASSWORD_RESET: &str = "Password has been reset. You can now log in.";
pub const PASSWORD_CHANGED: &str = "Password changed successfully.";
pub const PROFILE_UPDATED: &str = "Profile updated successfully.";

/// Reject passwords the backend would refuse before sending anything.
pub fn check_new_password(password: &Password, confirmation: Option<&Password>) -> Result<()> {
    if password.expose().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(Error::InvalidInput(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if confirmation.is_some_and(|c| c != password) {
        return Err(Error::InvalidInput("Passwords do not match".into()));
    }
    Ok(())
}

pub async fn forgot_password<A>(auth: &A, email: &str) -> Result<String>
where
    A: AuthService + ?Sized,
{
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::InvalidInput("Email is required".into()));
    }
    let receipt = auth.forgot_password(email).await?;
    Ok(receipt.summary(RESET_EMAIL_SENT))
}

pub async fn reset_password<A>(
    auth: &A,
    email: &str,
    token: &str,
    new_password: &Password,
) -> Result<String>
where
    A: AuthService + ?Sized,
{
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::InvalidInput("Reset token is required".into()));
    }
    check_new_password(new_password, None)?;
    let receipt = auth
        .reset_password(email.trim(), token, new_password.expose())
        .await?;
    tracing::info!("Password reset completed");
    Ok(receipt.summary(PASSWORD_RESET))
}

pub async fn change_password<A>(
    auth: &A,
    session: &Session,
    old_password: &Password,
    new_password: &Password,
) -> Result<String>
where
    A: AuthService + ?Sized,
{
    check_new_password(new_password, None)?;
    if old_password == new_password {
        return Err(Error::InvalidInput("New password must differ from the current one".into()));
    }
    let receipt = auth
        .change_password(&session.tokens, old_password.expose(), new_password.expose())
        .await?;
    tracing::info!(user_id = %session.user.id, "Password changed");
    Ok(receipt.summary(PASSWORD_CHANGED))
}

/// Apply `update` and refresh the stored profile from the backend.
///
/// The session's user is replaced only when the re-read succeeds; a failed
/// re-read still reports the update as done.
pub async fn update_profile<A>(
    auth: &A,
    session: &mut Session,
    update: &ProfileUpdate,
) -> Result<String>
where
    A: AuthService + ?Sized,
{
    let body = serde_json::to_value(update)?;
    if body.as_object().is_some_and(|fields| fields.is_empty()) {
        return Err(Error::InvalidInput("Nothing to update; pass at least one field".into()));
    }

    let receipt = auth.update_profile(&session.tokens, update).await?;
    match auth.current_user(&session.tokens).await {
        Ok(user) => session.user = user,
        Err(e) => tracing::warn!(error = %e, "Profile updated but could not be re-read"),
    }
    Ok(receipt.summary(PROFILE_UPDATED))
}
