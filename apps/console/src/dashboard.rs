//! Dashboard: record counts and recent activity
//!
//! Counts are computed from the same collections the list screens load, so
//! the dashboard works for every role. Collections the caller is not allowed
//! to read (HTTP 403) are reported as unavailable instead of failing the
//! whole screen.

use casedesk_client::{
    Activity, CaseStatus, Error as ClientError, Gender, RecordService, RiskLevel, Role, User,
};
use casedesk_listing::Categorical;
use serde::Serialize;
use std::fmt::Write as _;

use crate::error::Result;
use crate::format::Formatter;

/// Number of feed entries shown under "Recent activity".
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Count of records carrying one categorical value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub value: &'static str,
    pub count: usize,
}

/// One count per variant of `T`, in declaration order, zeros included.
pub fn tally<T, I>(values: I) -> Vec<Tally>
where
    T: Categorical + PartialEq,
    I: IntoIterator<Item = T>,
{
    let mut counts = vec![0usize; T::VARIANTS.len()];
    for value in values {
        if let Some(index) = T::VARIANTS.iter().position(|v| *v == value) {
            counts[index] += 1;
        }
    }
    T::VARIANTS
        .iter()
        .zip(counts)
        .map(|(variant, count)| Tally {
            value: variant.as_str(),
            count,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub archived: usize,
    pub by_role: Vec<Tally>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientStats {
    pub total: usize,
    pub deleted: usize,
    pub by_gender: Vec<Tally>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseStats {
    pub total: usize,
    pub deleted: usize,
    pub by_status: Vec<Tally>,
    pub by_risk: Vec<Tally>,
    /// Cases without a risk level yet.
    pub unscored: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    /// `None` when the caller may not list users.
    pub users: Option<UserStats>,
    pub patients: Option<PatientStats>,
    pub cases: Option<CaseStats>,
    /// Newest first, at most [`RECENT_ACTIVITY_LIMIT`] entries.
    pub recent_activity: Option<Vec<Activity>>,
}

impl DashboardStats {
    /// Load every collection concurrently and count.
    pub async fn collect<S: RecordService + ?Sized>(service: &S) -> Result<Self> {
        let (users, archived_users, patients, deleted_patients, cases, deleted_cases, activity) =
            tokio::join!(
                service.list_users(),
                service.list_archived_users(),
                service.list_patients(),
                service.list_archived_patients(),
                service.list_cases(),
                service.list_deleted_cases(),
                service.list_activities(),
            );

        let users = match (visible(users)?, visible(archived_users)?) {
            (Some(users), archived) => Some(user_stats(&users, archived.map_or(0, |a| a.len()))),
            (None, _) => None,
        };

        let patients = match (visible(patients)?, visible(deleted_patients)?) {
            (Some(active), deleted) => Some(PatientStats {
                total: active.len(),
                deleted: deleted.map_or(0, |d| d.len()),
                by_gender: tally::<Gender, _>(active.iter().map(|p| p.gender)),
            }),
            (None, _) => None,
        };

        let cases = match (visible(cases)?, visible(deleted_cases)?) {
            (Some(active), deleted) => Some(CaseStats {
                total: active.len(),
                deleted: deleted.map_or(0, |d| d.len()),
                by_status: tally::<CaseStatus, _>(active.iter().map(|c| c.status)),
                by_risk: tally::<RiskLevel, _>(active.iter().filter_map(|c| c.risk_level)),
                unscored: active.iter().filter(|c| c.risk_level.is_none()).count(),
            }),
            (None, _) => None,
        };

        let recent_activity = visible(activity)?.map(|mut feed| {
            feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            feed.truncate(RECENT_ACTIVITY_LIMIT);
            feed
        });

        Ok(Self {
            users,
            patients,
            cases,
            recent_activity,
        })
    }
}

fn user_stats(users: &[User], archived: usize) -> UserStats {
    let active = users.iter().filter(|u| u.is_active).count();
    UserStats {
        total: users.len(),
        active,
        inactive: users.len() - active,
        archived,
        by_role: tally::<Role, _>(users.iter().map(|u| u.role)),
    }
}

/// `Ok(None)` for collections the caller is forbidden to read.
fn visible<T>(result: casedesk_client::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ClientError::Api { status: 403, .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn tally_line(tallies: &[Tally]) -> String {
    tallies
        .iter()
        .map(|t| format!("{} {}", t.value, t.count))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Plain-text rendering of the dashboard.
pub fn render_text(stats: &DashboardStats, fmt: &Formatter) -> String {
    let mut out = String::new();

    match &stats.users {
        Some(users) => {
            let _ = writeln!(
                out,
                "Users     {} (active {}, inactive {}, archived {})",
                users.total, users.active, users.inactive, users.archived
            );
            let _ = writeln!(out, "  role    {}", tally_line(&users.by_role));
        }
        None => out.push_str("Users     not available\n"),
    }

    match &stats.patients {
        Some(patients) => {
            let _ = writeln!(out, "Patients  {} (deleted {})", patients.total, patients.deleted);
            let _ = writeln!(out, "  gender  {}", tally_line(&patients.by_gender));
        }
        None => out.push_str("Patients  not available\n"),
    }

    match &stats.cases {
        Some(cases) => {
            let _ = writeln!(out, "Cases     {} (deleted {})", cases.total, cases.deleted);
            let _ = writeln!(out, "  status  {}", tally_line(&cases.by_status));
            let _ = writeln!(
                out,
                "  risk    {}  unscored {}",
                tally_line(&cases.by_risk),
                cases.unscored
            );
        }
        None => out.push_str("Cases     not available\n"),
    }

    if let Some(feed) = &stats.recent_activity {
        out.push_str("Recent activity");
        if feed.is_empty() {
            out.push_str("\n  none");
        }
        for activity in feed {
            let _ = write!(
                out,
                "\n  {}  {}",
                fmt.relative(activity.created_at),
                activity
                    .description
                    .as_deref()
                    .unwrap_or(activity.action.as_str())
            );
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_keeps_every_variant_in_order() {
        let counts: Vec<_> = tally([RiskLevel::High, RiskLevel::Low, RiskLevel::High])
            .into_iter()
            .map(|t| (t.value, t.count))
            .collect();
        assert_eq!(counts, vec![("low", 1), ("medium", 0), ("high", 2), ("critical", 0)]);
    }

    #[test]
    fn forbidden_is_not_an_error() {
        let forbidden: casedesk_client::Result<Vec<User>> = Err(ClientError::Api {
            status: 403,
            body: Default::default(),
        });
        assert!(visible(forbidden).unwrap().is_none());

        let broken: casedesk_client::Result<Vec<User>> = Err(ClientError::Api {
            status: 500,
            body: Default::default(),
        });
        assert!(visible(broken).is_err());
    }
}
