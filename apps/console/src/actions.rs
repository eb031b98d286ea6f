//! Record mutations with operator feedback
//!
//! [`ActionRunner`] wraps a [`RecordService`] so that every mutation ends in
//! exactly one [`Banner`]: success or failure, never both. Failures are
//! converted to display text and never escape as errors. A second action on
//! the same target while one is outstanding is rejected without a request.

use casedesk_client::{ActionReceipt, RecordKind, RecordService};
use serde_json::Value as JsonValue;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// A mutation against one record kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Create(JsonValue),
    Update { id: String, body: JsonValue },
    Archive { id: String },
    Restore { id: String },
    Purge { id: String },
}

impl Action {
    /// Record the action targets; `None` for creation.
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Self::Create(_) => None,
            Self::Update { id, .. }
            | Self::Archive { id }
            | Self::Restore { id }
            | Self::Purge { id } => Some(id),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Update { .. } => "update",
            Self::Archive { .. } => "archive",
            Self::Restore { .. } => "restore",
            Self::Purge { .. } => "purge",
        }
    }

    fn success_text(&self, kind: RecordKind) -> String {
        let noun = capitalize(kind.label());
        match self {
            Self::Create(_) => format!("{noun} created successfully."),
            Self::Update { .. } => format!("{noun} updated successfully."),
            Self::Archive { .. } => format!("{noun} archived successfully."),
            Self::Restore { .. } => format!("{noun} restored successfully."),
            Self::Purge { .. } => format!("{noun} permanently deleted."),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Failure,
}

/// Self-expiring feedback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
    expires_at: Instant,
}

impl Banner {
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Result of [`ActionRunner::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Succeeded {
        message: String,
        receipt: ActionReceipt,
    },
    Failed {
        message: String,
        conflict_fields: Vec<String>,
    },
    /// Another action on the same target is still in flight.
    Busy,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

type Target = (RecordKind, String);

/// Executes record actions and keeps the current feedback banner.
pub struct ActionRunner<S> {
    service: S,
    banner_ttl: Duration,
    in_flight: Mutex<HashSet<Target>>,
    banner: Mutex<Option<Banner>>,
}

impl<S: RecordService> ActionRunner<S> {
    pub fn new(service: S, banner_ttl: Duration) -> Self {
        Self {
            service,
            banner_ttl,
            in_flight: Mutex::new(HashSet::new()),
            banner: Mutex::new(None),
        }
    }

    /// Whether an action on `(kind, id)` is outstanding.
    pub fn is_in_flight(&self, kind: RecordKind, id: &str) -> bool {
        lock(&self.in_flight).contains(&(kind, id.to_string()))
    }

    /// Current banner, clearing it first if it has expired.
    pub fn banner(&self) -> Option<Banner> {
        self.banner_at(Instant::now())
    }

    pub fn banner_at(&self, now: Instant) -> Option<Banner> {
        let mut banner = lock(&self.banner);
        if banner.as_ref().is_some_and(|b| b.is_expired_at(now)) {
            *banner = None;
        }
        banner.clone()
    }

    pub async fn run(&self, kind: RecordKind, action: Action) -> Outcome {
        let _guard = match action.target_id() {
            Some(id) => match InFlight::acquire(&self.in_flight, (kind, id.to_string())) {
                Some(guard) => Some(guard),
                None => {
                    tracing::debug!(%kind, id, verb = action.verb(), "Action already in flight");
                    return Outcome::Busy;
                }
            },
            None => None,
        };

        let result = match &action {
            Action::Create(body) => self.service.create(kind, body).await,
            Action::Update { id, body } => self.service.update(kind, id, body).await,
            Action::Archive { id } => self.service.archive(kind, id).await,
            Action::Restore { id } => self.service.restore(kind, id).await,
            Action::Purge { id } => self.service.purge(kind, id).await,
        };

        match result {
            Ok(receipt) => {
                let message = receipt.summary(&action.success_text(kind));
                self.show(BannerKind::Success, message.clone());
                Outcome::Succeeded { message, receipt }
            }
            Err(e) => {
                tracing::warn!(
                    %kind,
                    id = action.target_id(),
                    verb = action.verb(),
                    error = %e,
                    "Record action failed"
                );
                let message = e.display_message();
                let conflict_fields = e.conflict_fields().to_vec();
                self.show(BannerKind::Failure, failure_text(&message, &conflict_fields));
                Outcome::Failed {
                    message,
                    conflict_fields,
                }
            }
        }
    }

    fn show(&self, kind: BannerKind, text: String) {
        *lock(&self.banner) = Some(Banner {
            kind,
            text,
            expires_at: Instant::now() + self.banner_ttl,
        });
    }
}

/// Banner text for a failure, naming conflicting fields when present.
pub fn failure_text(message: &str, conflict_fields: &[String]) -> String {
    if conflict_fields.is_empty() {
        message.to_string()
    } else {
        format!("{message} (conflicting fields: {})", conflict_fields.join(", "))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds a target in the in-flight set until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<Target>>,
    target: Target,
}

impl<'a> InFlight<'a> {
    fn acquire(set: &'a Mutex<HashSet<Target>>, target: Target) -> Option<Self> {
        if lock(set).insert(target.clone()) {
            Some(Self { set, target })
        } else {
            None
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        lock(self.set).remove(&self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_lists_conflicts() {
        assert_eq!(failure_text("Deleted case not found", &[]), "Deleted case not found");
        assert_eq!(
            failure_text(
                "Cannot restore: active record exists",
                &["identity_number".to_string(), "email".to_string()]
            ),
            "Cannot restore: active record exists (conflicting fields: identity_number, email)"
        );
    }

    #[test]
    fn in_flight_guard_releases_on_drop() {
        let set = Mutex::new(HashSet::new());
        let target = (RecordKind::Patient, "p1".to_string());
        let guard = InFlight::acquire(&set, target.clone()).unwrap();
        assert!(InFlight::acquire(&set, target.clone()).is_none());
        assert!(InFlight::acquire(&set, (RecordKind::Case, "p1".to_string())).is_some());
        drop(guard);
        assert!(InFlight::acquire(&set, target).is_some());
    }

    #[test]
    fn success_text_names_the_kind() {
        let action = Action::Restore { id: "1".into() };
        assert_eq!(
            action.success_text(RecordKind::Patient),
            "Patient restored successfully."
        );
        assert_eq!(Action::Create(JsonValue::Null).target_id(), None);
    }
}
