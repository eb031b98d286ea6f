//! Categorical filters for each list screen

use casedesk_client::{
    AccountStatus, Activity, ActivityAction, ArchivedUser, Case, CaseStatus, EntityType, Gender,
    Patient, RiskLevel, Role, User,
};
use casedesk_listing::{Criteria, Selection};

/// Patients and archived patients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatientCriteria {
    pub gender: Selection<Gender>,
}

impl Criteria<Patient> for PatientCriteria {
    fn admits(&self, patient: &Patient) -> bool {
        self.gender.admits(Some(patient.gender))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserCriteria {
    pub role: Selection<Role>,
    pub status: Selection<AccountStatus>,
}

impl Criteria<User> for UserCriteria {
    fn admits(&self, user: &User) -> bool {
        self.role.admits(Some(user.role)) && self.status.admits(Some(user.status()))
    }
}

/// Archived users carry no activity flag, so only the role is filterable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArchivedUserCriteria {
    pub role: Selection<Role>,
}

impl Criteria<ArchivedUser> for ArchivedUserCriteria {
    fn admits(&self, user: &ArchivedUser) -> bool {
        self.role.admits(Some(user.role))
    }
}

/// Cases and deleted cases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseCriteria {
    pub status: Selection<CaseStatus>,
    pub risk_level: Selection<RiskLevel>,
}

impl Criteria<Case> for CaseCriteria {
    fn admits(&self, case: &Case) -> bool {
        self.status.admits(Some(case.status)) && self.risk_level.admits(case.risk_level)
    }
}

/// Activity feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCriteria {
    pub action: Selection<ActivityAction>,
    pub entity_type: Selection<EntityType>,
}

impl Criteria<Activity> for ActivityCriteria {
    fn admits(&self, activity: &Activity) -> bool {
        self.action.admits(Some(activity.action))
            && self.entity_type.admits(Some(activity.entity_type))
    }
}
