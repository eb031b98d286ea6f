//! Record service: listings and mutations keyed by record kind and id

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    client::ApiClient,
    error::Result,
    models::{Activity, ArchivedUser, Case, Patient, RecordKind, User},
};

/// Success payload of a mutation.
///
/// The backend answers with `{"status": ..., "message": ...}` for restore and
/// permanent delete, `{"detail": ...}` for archival, and the created/updated
/// record for create/update. Only the fields useful for feedback are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl ActionReceipt {
    /// Backend-provided message, else `default`.
    pub fn summary(&self, default: &str) -> String {
        self.message
            .as_deref()
            .or(self.detail.as_deref())
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(default)
            .to_string()
    }
}

/// Record source collaborator.
///
/// List methods return the fully materialized collection in backend order.
/// Mutations are keyed by [`RecordKind`] and record id; for archived users
/// the id is the archive entry id.
#[async_trait]
pub trait RecordService: Send + Sync {
    async fn list_patients(&self) -> Result<Vec<Patient>>;

    async fn list_archived_patients(&self) -> Result<Vec<Patient>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    async fn list_archived_users(&self) -> Result<Vec<ArchivedUser>>;

    async fn list_cases(&self) -> Result<Vec<Case>>;

    async fn list_deleted_cases(&self) -> Result<Vec<Case>>;

    /// Audit feed visible to the caller, newest first.
    async fn list_activities(&self) -> Result<Vec<Activity>>;

    async fn create(&self, kind: RecordKind, body: &JsonValue) -> Result<ActionReceipt>;

    async fn update(&self, kind: RecordKind, id: &str, body: &JsonValue) -> Result<ActionReceipt>;

    /// Soft delete (patients, cases) or move to the archive table (users).
    async fn archive(&self, kind: RecordKind, id: &str) -> Result<ActionReceipt>;

    async fn restore(&self, kind: RecordKind, id: &str) -> Result<ActionReceipt>;

    /// Permanently delete; cannot be undone.
    async fn purge(&self, kind: RecordKind, id: &str) -> Result<ActionReceipt>;
}

const ACTIVITIES_PATH: &str = "api/v1/activities/";

fn collection_path(kind: RecordKind) -> String {
    format!("api/v1/{}/", kind.collection())
}

fn record_path(kind: RecordKind, id: &str, action: Option<&str>) -> String {
    let id = urlencoding::encode(id);
    match action {
        Some(action) => format!("api/v1/{}/{id}/{action}/", kind.collection()),
        None => format!("api/v1/{}/{id}/", kind.collection()),
    }
}

#[async_trait]
impl RecordService for ApiClient {
    async fn list_patients(&self) -> Result<Vec<Patient>> {
        self.fetch_all(&collection_path(RecordKind::Patient)).await
    }

    async fn list_archived_patients(&self) -> Result<Vec<Patient>> {
        self.fetch_all(&format!("api/v1/{}/", RecordKind::Patient.archive_collection()))
            .await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        self.fetch_all(&collection_path(RecordKind::User)).await
    }

    async fn list_archived_users(&self) -> Result<Vec<ArchivedUser>> {
        self.fetch_all(&format!("api/v1/{}/", RecordKind::User.archive_collection()))
            .await
    }

    async fn list_cases(&self) -> Result<Vec<Case>> {
        self.fetch_all(&collection_path(RecordKind::Case)).await
    }

    async fn list_deleted_cases(&self) -> Result<Vec<Case>> {
        self.fetch_all(&format!("api/v1/{}/", RecordKind::Case.archive_collection()))
            .await
    }

    async fn list_activities(&self) -> Result<Vec<Activity>> {
        self.fetch_all(ACTIVITIES_PATH).await
    }

    async fn create(&self, kind: RecordKind, body: &JsonValue) -> Result<ActionReceipt> {
        tracing::info!(%kind, "Creating record");
        self.post_json(&collection_path(kind), body).await
    }

    async fn update(&self, kind: RecordKind, id: &str, body: &JsonValue) -> Result<ActionReceipt> {
        tracing::info!(%kind, id, "Updating record");
        self.patch_json(&record_path(kind, id, None), body).await
    }

    async fn archive(&self, kind: RecordKind, id: &str) -> Result<ActionReceipt> {
        tracing::info!(%kind, id, "Archiving record");
        self.delete_json(&record_path(kind, id, None)).await
    }

    async fn restore(&self, kind: RecordKind, id: &str) -> Result<ActionReceipt> {
        tracing::info!(%kind, id, "Restoring record");
        self.post_json(&record_path(kind, id, Some("restore")), &serde_json::json!({}))
            .await
    }

    async fn purge(&self, kind: RecordKind, id: &str) -> Result<ActionReceipt> {
        tracing::warn!(%kind, id, "Permanently deleting record");
        self.delete_json(&record_path(kind, id, Some("permanent-delete")))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_backend_routes() {
        assert_eq!(collection_path(RecordKind::User), "api/v1/users/");
        assert_eq!(
            record_path(RecordKind::Patient, "42", Some("restore")),
            "api/v1/patients/42/restore/"
        );
        assert_eq!(
            record_path(RecordKind::Case, "a/b", Some("permanent-delete")),
            "api/v1/cases/a%2Fb/permanent-delete/"
        );
        assert_eq!(record_path(RecordKind::User, "7", None), "api/v1/users/7/");
    }

    #[test]
    fn receipt_summary_prefers_message_then_detail() {
        let restored: ActionReceipt = serde_json::from_str(
            r#"{"status": "restored", "patient_code": "PT-1", "message": "Patient Ali and all related cases restored successfully"}"#,
        )
        .unwrap();
        assert_eq!(
            restored.summary("Restored"),
            "Patient Ali and all related cases restored successfully"
        );

        let archived: ActionReceipt =
            serde_json::from_str(r#"{"detail": "User archived successfully."}"#).unwrap();
        assert_eq!(archived.summary("Archived"), "User archived successfully.");

        assert_eq!(ActionReceipt::default().summary("Done"), "Done");
    }
}
