mod support;

use casedesk::dashboard::{self, DashboardStats, RECENT_ACTIVITY_LIMIT};
use casedesk::format::Formatter;
use casedesk::preferences::Preferences;
use casedesk_client::{ActivityAction, CaseStatus, EntityType, Gender, RiskLevel, Role};
use support::{activity, case, patient, user, FakeRecords};

fn records() -> FakeRecords {
    FakeRecords {
        patients: vec![
            patient(1, Gender::Male),
            patient(2, Gender::Female),
            patient(3, Gender::Female),
        ],
        archived_patients: vec![patient(4, Gender::Other)],
        users: vec![
            user(1, Role::Doctor, true),
            user(2, Role::Doctor, false),
            user(3, Role::Nurse, true),
            user(4, Role::Superadmin, true),
        ],
        cases: vec![
            case(1, CaseStatus::InProgress, Some(RiskLevel::High)),
            case(2, CaseStatus::InProgress, None),
            case(3, CaseStatus::Complete, Some(RiskLevel::Low)),
        ],
        deleted_cases: vec![case(4, CaseStatus::Cancelled, None)],
        activities: (1..=8)
            .map(|n| activity(n, ActivityAction::Create, EntityType::Patient, n as u32))
            .collect(),
        ..Default::default()
    }
}

fn count(tallies: &[dashboard::Tally], value: &str) -> usize {
    tallies
        .iter()
        .find(|t| t.value == value)
        .map(|t| t.count)
        .unwrap()
}

#[tokio::test]
async fn counts_every_collection() {
    let stats = DashboardStats::collect(&records()).await.unwrap();

    let users = stats.users.as_ref().unwrap();
    assert_eq!((users.total, users.active, users.inactive), (4, 3, 1));
    assert_eq!(count(&users.by_role, "doctor"), 2);
    assert_eq!(count(&users.by_role, "superadmin"), 1);

    let patients = stats.patients.as_ref().unwrap();
    assert_eq!((patients.total, patients.deleted), (3, 1));
    assert_eq!(count(&patients.by_gender, "female"), 2);
    assert_eq!(count(&patients.by_gender, "other"), 0);

    let cases = stats.cases.as_ref().unwrap();
    assert_eq!((cases.total, cases.deleted, cases.unscored), (3, 1, 1));
    assert_eq!(count(&cases.by_status, "in_progress"), 2);
    assert_eq!(count(&cases.by_status, "draft"), 0);
    assert_eq!(count(&cases.by_risk, "high"), 1);

    let feed = stats.recent_activity.as_ref().unwrap();
    assert_eq!(feed.len(), RECENT_ACTIVITY_LIMIT);
    let ids: Vec<_> = feed.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec!["a8", "a7", "a6", "a5", "a4"]);
}

#[tokio::test]
async fn forbidden_user_listing_is_left_out() {
    let records = FakeRecords {
        users_status: Some(403),
        ..records()
    };

    let stats = DashboardStats::collect(&records).await.unwrap();

    assert!(stats.users.is_none());
    assert_eq!(stats.patients.as_ref().unwrap().total, 3);

    let text = dashboard::render_text(&stats, &Formatter::new(Preferences::default()));
    assert!(text.starts_with("Users     not available"));
    assert!(text.contains("Patients  3 (deleted 1)"));
    assert!(text.contains("  risk    low 1  medium 0  high 1  critical 0  unscored 1"));
    assert!(text.contains("Dr. Lim created item 8"));
}

#[tokio::test]
async fn other_failures_fail_the_dashboard() {
    let records = FakeRecords {
        users_status: Some(500),
        ..records()
    };

    assert!(DashboardStats::collect(&records).await.is_err());
}
