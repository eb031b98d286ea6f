//! Record models returned by the backend list endpoints
//!
//! Categorical fields are closed enumerations so list screens can filter on
//! them with [`casedesk_listing::Selection`].

use casedesk_listing::{Categorical, Searchable};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Kinds of record managed through the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Patient,
    User,
    Case,
}

impl RecordKind {
    /// Collection segment under `/api/v1/`.
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Patient => "patients",
            Self::User => "users",
            Self::Case => "cases",
        }
    }

    /// Collection holding soft-deleted records of this kind.
    pub fn archive_collection(&self) -> &'static str {
        match self {
            Self::Patient => "patients/deleted",
            Self::User => "users/archived",
            Self::Case => "cases/deleted",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Patient => "patient",
            Self::User => "user",
            Self::Case => "case",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Categorical for Gender {
    const FIELD: &'static str = "gender";
    const VARIANTS: &'static [Self] = &[Self::Male, Self::Female, Self::Other];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    Nurse,
    Superadmin,
}

impl Categorical for Role {
    const FIELD: &'static str = "role";
    const VARIANTS: &'static [Self] = &[Self::Doctor, Self::Nurse, Self::Superadmin];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Doctor => "doctor",
            Self::Nurse => "nurse",
            Self::Superadmin => "superadmin",
        }
    }
}

/// Derived from a user's `is_active` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountStatus {
    Active,
    Inactive,
}

impl Categorical for AccountStatus {
    const FIELD: &'static str = "status";
    const VARIANTS: &'static [Self] = &[Self::Active, Self::Inactive];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Draft,
    InProgress,
    Complete,
    Cancelled,
}

impl Categorical for CaseStatus {
    const FIELD: &'static str = "status";
    const VARIANTS: &'static [Self] = &[
        Self::Draft,
        Self::InProgress,
        Self::Complete,
        Self::Cancelled,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl Categorical for RiskLevel {
    const FIELD: &'static str = "risk level";
    const VARIANTS: &'static [Self] = &[Self::Low, Self::Medium, Self::High, Self::Critical];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Patient row as listed by `/patients/` and `/patients/deleted/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: String,
    pub patient_code: String,
    pub full_name: String,
    #[serde(default)]
    pub identity_number: Option<String>,
    pub gender: Gender,
    #[serde(default)]
    pub dob: Option<NaiveDate>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub total_cases: Option<u32>,
    #[serde(default)]
    pub last_case_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_doctor: Option<String>,
    #[serde(default)]
    pub assigned_doctor_name: Option<String>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Searchable for Patient {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.full_name.as_str(), self.patient_code.as_str()]
    }
}

/// Active user row as listed by `/users/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    pub role: Role,
    pub is_active: bool,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn status(&self) -> AccountStatus {
        if self.is_active {
            AccountStatus::Active
        } else {
            AccountStatus::Inactive
        }
    }
}

impl Searchable for User {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.full_name.as_str(), self.email.as_str()]
    }
}

/// Archived user row as listed by `/users/archived/`.
///
/// `id` is the archive entry id used for restore and permanent delete;
/// `original_id` is the id the user had before archival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedUser {
    pub id: String,
    pub original_id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub archived_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Searchable for ArchivedUser {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.full_name.as_str(), self.email.as_str()]
    }
}

/// Case row as listed by `/cases/` and `/cases/deleted/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub id: String,
    #[serde(default)]
    pub case_code: Option<String>,
    #[serde(default)]
    pub patient_code: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub has_prediction: bool,
    #[serde(default)]
    pub has_recommendation: bool,
    pub status: CaseStatus,
    pub created_at: DateTime<Utc>,
}

impl Searchable for Case {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.case_code.as_deref().unwrap_or_default(),
            self.patient_name.as_deref().unwrap_or_default(),
            self.patient_code.as_deref().unwrap_or_default(),
        ]
    }
}

/// What an audited activity did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityAction {
    Create,
    Update,
    Delete,
    Save,
    Discard,
    Predict,
    Generate,
    Assign,
    Login,
    Logout,
}

impl Categorical for ActivityAction {
    const FIELD: &'static str = "action";
    const VARIANTS: &'static [Self] = &[
        Self::Create,
        Self::Update,
        Self::Delete,
        Self::Save,
        Self::Discard,
        Self::Predict,
        Self::Generate,
        Self::Assign,
        Self::Login,
        Self::Logout,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Save => "save",
            Self::Discard => "discard",
            Self::Predict => "predict",
            Self::Generate => "generate",
            Self::Assign => "assign",
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }
}

/// Kind of record an activity touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    User,
    Patient,
    Case,
    Document,
    Prediction,
    Recommendation,
}

impl Categorical for EntityType {
    const FIELD: &'static str = "entity type";
    const VARIANTS: &'static [Self] = &[
        Self::User,
        Self::Patient,
        Self::Case,
        Self::Document,
        Self::Prediction,
        Self::Recommendation,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Patient => "patient",
            Self::Case => "case",
            Self::Document => "document",
            Self::Prediction => "prediction",
            Self::Recommendation => "recommendation",
        }
    }
}

/// Audit trail entry as listed by `/activities/`, newest first.
///
/// The backend scopes the feed by role: superadmins see everything, doctors
/// and nurses see their own actions plus those on their patients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    /// Acting user's id; `None` for system actions or deleted users.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub user_role: Option<Role>,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: String,
    #[serde(default)]
    pub details: JsonValue,
    /// Human-readable sentence such as "Dr. Lim created Patient Ali".
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Searchable for Activity {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.user_name.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default(),
        ]
    }
}

/// Body for `POST /users/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Body for `PATCH /users/{id}/`; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

/// Body for `PATCH /users/profile/update/`; the logged-in user edits only
/// their own contact details and two-factor setting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_enabled: Option<bool>,
}

/// Body for `POST /patients/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPatient {
    pub full_name: String,
    pub identity_number: String,
    pub gender: Gender,
    pub phone_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_doctor: Option<String>,
}

/// Body for `PATCH /patients/{id}/`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PatientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_doctor: Option<String>,
}

/// Body for `POST /cases/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCase {
    pub patient: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
