//! casedesk REST client
//!
//! Thin async wrappers over the case-management backend's REST API:
//!
//! - [`RecordService`]: list, create, update, archive, restore and
//!   permanently delete patients, users and cases
//! - [`AuthService`]: two-factor checks, code dispatch/verification, login,
//!   current-user lookup, profile edits and password reset/change
//!
//! The activity feed is read through [`RecordService::list_activities`].
//!
//! Both traits are implemented by [`ApiClient`]; the console depends on the
//! traits so tests can substitute doubles.
//!
//! # Example
//!
//! ```rust,no_run
//! use casedesk_client::{ApiClient, RecordService};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ApiClient::new("http://localhost:8000", Duration::from_secs(30))?
//!     .with_token("access-token");
//! let patients = client.list_patients().await?;
//! println!("{} patients", patients.len());
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod records;

pub use auth::{AuthService, CurrentUser, TokenPair, MIN_PASSWORD_LENGTH};
pub use client::ApiClient;
pub use error::{ApiErrorBody, Error, Result, FALLBACK_MESSAGE};
pub use models::{
    AccountStatus, Activity, ActivityAction, ArchivedUser, Case, CaseStatus, EntityType, Gender,
    NewCase, NewPatient, NewUser, Patient, PatientUpdate, ProfileUpdate, RecordKind, RiskLevel,
    Role, User, UserUpdate,
};
pub use records::{ActionReceipt, RecordService};
