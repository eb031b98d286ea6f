//! Hand-written service doubles shared by the console integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use casedesk_client::{
    ActionReceipt, Activity, ActivityAction, ApiErrorBody, ArchivedUser, AuthService, Case,
    CaseStatus, CurrentUser, EntityType, Error as ClientError, Gender, Patient, ProfileUpdate,
    RecordKind, RecordService, Result as ClientResult, RiskLevel, Role, TokenPair, User,
};
use chrono::{TimeZone, Utc};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Ordered log of calls made against a double.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

pub fn api_error(status: u16, body: &str) -> ClientError {
    ClientError::Api {
        status,
        body: ApiErrorBody::from_bytes(body.as_bytes()),
    }
}

/// Outcome of the two-factor status check.
#[derive(Debug, Clone, Copy)]
pub enum TwoFactor {
    Enabled,
    Disabled,
    Unreachable,
}

/// Auth double accepting one email/password pair and one code.
#[derive(Debug, Clone)]
pub struct FakeAuth {
    pub two_factor: TwoFactor,
    pub password: String,
    pub code: String,
    pub send_fails: bool,
    /// Forces `login` to fail with this status regardless of credentials.
    pub login_status: Option<u16>,
    /// Forces `current_user` to fail with this status.
    pub me_status: Option<u16>,
    /// Token accepted by `reset_password`.
    pub reset_token: String,
    /// Profile returned by `current_user`; edited by `update_profile`.
    pub profile: Arc<Mutex<CurrentUser>>,
    /// Password set by a reset or change, shared across clones.
    pub changed_password: Arc<Mutex<Option<String>>>,
    pub log: CallLog,
}

impl FakeAuth {
    pub fn new(two_factor: TwoFactor) -> Self {
        Self {
            two_factor,
            password: "correct horse".to_string(),
            code: "246810".to_string(),
            send_fails: false,
            login_status: None,
            me_status: None,
            reset_token: "reset-123".to_string(),
            profile: Arc::new(Mutex::new(doctor())),
            changed_password: Arc::new(Mutex::new(None)),
            log: CallLog::default(),
        }
    }
}

pub fn doctor() -> CurrentUser {
    CurrentUser {
        id: "u-lim".into(),
        full_name: "Dr. Lim".into(),
        email: "lim@clinic.test".into(),
        role: Role::Doctor,
        is_active: true,
        two_factor_enabled: true,
        last_login: None,
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn two_factor_enabled(&self, email: &str) -> ClientResult<bool> {
        self.log.push(format!("check {email}"));
        match self.two_factor {
            TwoFactor::Enabled => Ok(true),
            TwoFactor::Disabled => Ok(false),
            TwoFactor::Unreachable => Err(api_error(503, r#"{"detail": "Service unavailable"}"#)),
        }
    }

    async fn send_code(&self, email: &str) -> ClientResult<()> {
        self.log.push(format!("send {email}"));
        if self.send_fails {
            return Err(api_error(500, r#"{"error": "Failed to send verification code"}"#));
        }
        Ok(())
    }

    async fn verify_code(&self, email: &str, code: &str) -> ClientResult<bool> {
        self.log.push(format!("verify {email} {code}"));
        Ok(code == self.code)
    }

    async fn login(&self, email: &str, password: &str) -> ClientResult<TokenPair> {
        self.log.push(format!("login {email}"));
        if let Some(status) = self.login_status {
            return Err(api_error(status, r#"{"detail": "Backend exploded"}"#));
        }
        if password != self.current_password() {
            return Err(api_error(
                401,
                r#"{"detail": "No active account found with the given credentials"}"#,
            ));
        }
        Ok(TokenPair {
            access: "access-token".into(),
            refresh: "refresh-token".into(),
        })
    }

    async fn current_user(&self, tokens: &TokenPair) -> ClientResult<CurrentUser> {
        self.log.push(format!("me {}", tokens.access));
        if let Some(status) = self.me_status {
            return Err(api_error(
                status,
                r#"{"detail": "Given token not valid for any token type"}"#,
            ));
        }
        Ok(self.profile.lock().unwrap().clone())
    }

    async fn logout(&self, _tokens: &TokenPair) -> ClientResult<()> {
        self.log.push("logout");
        Ok(())
    }

    async fn forgot_password(&self, email: &str) -> ClientResult<ActionReceipt> {
        self.log.push(format!("forgot {email}"));
        if email != doctor().email {
            return Err(api_error(400, r#"{"email": ["No user found with this email address."]}"#));
        }
        Ok(detail("Password reset email sent. Please check your email."))
    }

    async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> ClientResult<ActionReceipt> {
        self.log.push(format!("reset {email} {token}"));
        if token != self.reset_token {
            return Err(api_error(400, r#"{"token": ["Invalid or expired reset token."]}"#));
        }
        self.set_password(new_password);
        Ok(ActionReceipt::default())
    }

    async fn change_password(
        &self,
        tokens: &TokenPair,
        old_password: &str,
        new_password: &str,
    ) -> ClientResult<ActionReceipt> {
        self.log.push(format!("change {}", tokens.access));
        if old_password != self.current_password() {
            return Err(api_error(400, r#"{"old_password": ["Old password is incorrect."]}"#));
        }
        self.set_password(new_password);
        Ok(detail("Password changed successfully."))
    }

    async fn update_profile(
        &self,
        tokens: &TokenPair,
        update: &ProfileUpdate,
    ) -> ClientResult<ActionReceipt> {
        self.log.push(format!("profile {}", tokens.access));
        let mut profile = self.profile.lock().unwrap();
        if let Some(name) = &update.full_name {
            profile.full_name = name.clone();
        }
        if let Some(email) = &update.email {
            profile.email = email.clone();
        }
        if let Some(enabled) = update.two_factor_enabled {
            profile.two_factor_enabled = enabled;
        }
        Ok(detail("Profile updated successfully."))
    }
}

impl FakeAuth {
    fn current_password(&self) -> String {
        self.changed_password
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| self.password.clone())
    }

    fn set_password(&self, password: &str) {
        *self.changed_password.lock().unwrap() = Some(password.to_string());
    }
}

fn detail(message: &str) -> ActionReceipt {
    ActionReceipt {
        detail: Some(message.to_string()),
        ..Default::default()
    }
}

/// Record double serving fixed collections and scripted mutation results.
#[derive(Debug, Clone, Default)]
pub struct FakeRecords {
    pub patients: Vec<Patient>,
    pub archived_patients: Vec<Patient>,
    pub users: Vec<User>,
    pub archived_users: Vec<ArchivedUser>,
    pub cases: Vec<Case>,
    pub deleted_cases: Vec<Case>,
    pub activities: Vec<Activity>,
    /// User listings fail with this status when set, e.g. 403 for non-admins.
    pub users_status: Option<u16>,
    /// Mutations fail with this error body and status when set.
    pub failure: Option<(u16, &'static str)>,
    /// Mutations wait for this before answering when set.
    pub gate: Option<Arc<Notify>>,
    pub log: CallLog,
}

impl FakeRecords {
    fn users_gate(&self) -> ClientResult<()> {
        match self.users_status {
            Some(status) => Err(api_error(
                status,
                r#"{"detail": "You do not have permission to perform this action."}"#,
            )),
            None => Ok(()),
        }
    }

    async fn mutate(&self, call: String) -> ClientResult<ActionReceipt> {
        self.log.push(call);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match self.failure {
            Some((status, body)) => Err(api_error(status, body)),
            None => Ok(ActionReceipt {
                status: Some("ok".into()),
                message: Some("Done by backend".into()),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl RecordService for FakeRecords {
    async fn list_patients(&self) -> ClientResult<Vec<Patient>> {
        self.log.push("list patients");
        Ok(self.patients.clone())
    }

    async fn list_archived_patients(&self) -> ClientResult<Vec<Patient>> {
        self.log.push("list archived patients");
        Ok(self.archived_patients.clone())
    }

    async fn list_users(&self) -> ClientResult<Vec<User>> {
        self.log.push("list users");
        self.users_gate()?;
        Ok(self.users.clone())
    }

    async fn list_archived_users(&self) -> ClientResult<Vec<ArchivedUser>> {
        self.log.push("list archived users");
        self.users_gate()?;
        Ok(self.archived_users.clone())
    }

    async fn list_cases(&self) -> ClientResult<Vec<Case>> {
        self.log.push("list cases");
        Ok(self.cases.clone())
    }

    async fn list_deleted_cases(&self) -> ClientResult<Vec<Case>> {
        self.log.push("list deleted cases");
        Ok(self.deleted_cases.clone())
    }

    async fn list_activities(&self) -> ClientResult<Vec<Activity>> {
        self.log.push("list activities");
        Ok(self.activities.clone())
    }

    async fn create(&self, kind: RecordKind, _body: &JsonValue) -> ClientResult<ActionReceipt> {
        self.mutate(format!("create {kind}")).await
    }

    async fn update(
        &self,
        kind: RecordKind,
        id: &str,
        _body: &JsonValue,
    ) -> ClientResult<ActionReceipt> {
        self.mutate(format!("update {kind} {id}")).await
    }

    async fn archive(&self, kind: RecordKind, id: &str) -> ClientResult<ActionReceipt> {
        self.mutate(format!("archive {kind} {id}")).await
    }

    async fn restore(&self, kind: RecordKind, id: &str) -> ClientResult<ActionReceipt> {
        self.mutate(format!("restore {kind} {id}")).await
    }

    async fn purge(&self, kind: RecordKind, id: &str) -> ClientResult<ActionReceipt> {
        self.mutate(format!("purge {kind} {id}")).await
    }
}

pub fn patient(n: usize, gender: Gender) -> Patient {
    Patient {
        id: format!("p{n}"),
        patient_code: format!("PT-{n:04}"),
        full_name: format!("Patient {n}"),
        identity_number: None,
        gender,
        dob: None,
        age: Some(30),
        phone_number: None,
        email: None,
        total_cases: Some(1),
        last_case_date: None,
        assigned_doctor: None,
        assigned_doctor_name: Some("Dr. Lim".into()),
        created_by_name: None,
        created_at: Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
        updated_at: None,
    }
}

pub fn case(n: usize, status: CaseStatus, risk_level: Option<RiskLevel>) -> Case {
    Case {
        id: format!("c{n}"),
        case_code: Some(format!("CASE-{n:03}")),
        patient_code: Some(format!("PT-{n:04}")),
        patient_name: Some(format!("Patient {n}")),
        doctor_name: None,
        risk_level,
        has_prediction: risk_level.is_some(),
        has_recommendation: false,
        status,
        created_at: Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap(),
    }
}

pub fn user(n: usize, role: Role, is_active: bool) -> User {
    User {
        id: format!("u{n}"),
        full_name: format!("User {n}"),
        email: format!("user{n}@clinic.test"),
        phone_number: None,
        role,
        is_active,
        last_login: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
        updated_at: None,
    }
}

pub fn activity(n: usize, action: ActivityAction, entity_type: EntityType, day: u32) -> Activity {
    Activity {
        id: format!("a{n}"),
        user: Some("u-lim".into()),
        user_name: Some("Dr. Lim".into()),
        user_role: Some(Role::Doctor),
        action,
        entity_type,
        entity_id: format!("e{n}"),
        details: JsonValue::Null,
        description: Some(format!("Dr. Lim {} item {n}", action_verb(action))),
        ip_address: None,
        created_at: Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap(),
    }
}

fn action_verb(action: ActivityAction) -> &'static str {
    match action {
        ActivityAction::Create => "created",
        ActivityAction::Update => "updated",
        ActivityAction::Delete => "deleted",
        _ => "touched",
    }
}
