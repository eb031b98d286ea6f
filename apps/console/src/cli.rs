//! Command-line interface definition

use casedesk_client::{
    AccountStatus, ActivityAction, CaseStatus, EntityType, Gender, RecordKind, RiskLevel, Role,
};
use casedesk_listing::{Categorical, Selection};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "casedesk",
    version,
    about = "Administration console for the clinical case-management backend"
)]
pub struct Cli {
    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Override `api.base_url` from the configuration.
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, completing two-factor verification when enabled.
    Login {
        #[arg(long)]
        email: String,
        /// Read from the prompt when omitted.
        #[arg(long, env = "CASEDESK_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Revoke the stored session.
    Logout,
    /// Show the signed-in user and their resolved preferences.
    Whoami,
    /// List or manage patients.
    Patients(PatientsArgs),
    /// List or manage users.
    Users(UsersArgs),
    /// List or create cases.
    Cases(CasesArgs),
    /// Archive (soft delete) a record.
    Archive(TargetArgs),
    /// Restore an archived record.
    Restore(TargetArgs),
    /// Permanently delete an archived record.
    Purge {
        #[command(flatten)]
        target: TargetArgs,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Show or change display preferences.
    Prefs {
        #[command(subcommand)]
        command: PrefsCommand,
    },
    /// Show record counts and recent activity.
    Dashboard,
    /// List the audit activity feed.
    Activity(ActivityArgs),
    /// Request a reset, reset with a token, or change a password.
    Password {
        #[command(subcommand)]
        command: PasswordCommand,
    },
    /// Edit the signed-in user's own profile.
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
}

/// Shared list options.
#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    /// Case-insensitive text search.
    #[arg(long, short, default_value = "")]
    pub search: String,
    /// 1-based page; out-of-range pages are clamped.
    #[arg(long, short, default_value_t = 1)]
    pub page: usize,
    /// Override `listing.page_size`.
    #[arg(long)]
    pub page_size: Option<usize>,
    /// List archived/deleted records instead of active ones.
    #[arg(long)]
    pub archived: bool,
}

#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct PatientsArgs {
    #[command(subcommand)]
    pub command: Option<PatientsCommand>,
    #[command(flatten)]
    pub list: ListArgs,
    #[arg(long, default_value = "all", value_parser = Selection::<Gender>::parse)]
    pub gender: Selection<Gender>,
}

#[derive(Debug, Subcommand)]
pub enum PatientsCommand {
    /// Register a patient.
    Create {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        identity_number: String,
        #[arg(long, value_parser = categorical::<Gender>)]
        gender: Gender,
        #[arg(long)]
        phone: String,
        #[arg(long, value_parser = parse_date)]
        dob: Option<NaiveDate>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        /// Assigned doctor's user id.
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Change patient details.
    Update {
        id: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        doctor: Option<String>,
    },
}

#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: Option<UsersCommand>,
    #[command(flatten)]
    pub list: ListArgs,
    #[arg(long, default_value = "all", value_parser = Selection::<Role>::parse)]
    pub role: Selection<Role>,
    /// Not available with `--archived`.
    #[arg(long, default_value = "all", value_parser = Selection::<AccountStatus>::parse)]
    pub status: Selection<AccountStatus>,
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// Create a staff account.
    Create {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, value_parser = categorical::<Role>)]
        role: Role,
        /// Read from the prompt when omitted.
        #[arg(long, env = "CASEDESK_NEW_USER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Change account details or activation.
    Update {
        id: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, value_parser = categorical::<Role>)]
        role: Option<Role>,
        #[arg(long)]
        active: Option<bool>,
    },
}

#[derive(Debug, Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct CasesArgs {
    #[command(subcommand)]
    pub command: Option<CasesCommand>,
    #[command(flatten)]
    pub list: ListArgs,
    #[arg(long, default_value = "all", value_parser = Selection::<CaseStatus>::parse)]
    pub status: Selection<CaseStatus>,
    #[arg(long = "risk", default_value = "all", value_parser = Selection::<RiskLevel>::parse)]
    pub risk_level: Selection<RiskLevel>,
}

#[derive(Debug, Subcommand)]
pub enum CasesCommand {
    /// Open a case for a patient.
    Create {
        /// Patient id.
        #[arg(long)]
        patient: String,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct ActivityArgs {
    /// `--archived` is not available for the feed.
    #[command(flatten)]
    pub list: ListArgs,
    #[arg(long, default_value = "all", value_parser = Selection::<ActivityAction>::parse)]
    pub action: Selection<ActivityAction>,
    #[arg(long = "entity", default_value = "all", value_parser = Selection::<EntityType>::parse)]
    pub entity_type: Selection<EntityType>,
}

#[derive(Debug, Subcommand)]
pub enum PasswordCommand {
    /// Email a password-reset token.
    Forgot {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using the emailed reset token.
    Reset {
        #[arg(long)]
        email: String,
        #[arg(long)]
        token: String,
        /// Read from the prompt, twice, when omitted.
        #[arg(long, env = "CASEDESK_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
    /// Change the signed-in user's password.
    Change {
        /// Read from the prompt when omitted.
        #[arg(long, env = "CASEDESK_PASSWORD", hide_env_values = true)]
        old_password: Option<String>,
        /// Read from the prompt, twice, when omitted.
        #[arg(long, env = "CASEDESK_NEW_PASSWORD", hide_env_values = true)]
        new_password: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileCommand {
    /// Change your name, email, phone or two-factor setting.
    Update {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        two_factor: Option<bool>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    #[arg(value_enum)]
    pub kind: KindArg,
    /// Record id; for archived users, the archive entry id.
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Patient,
    User,
    Case,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Patient => RecordKind::Patient,
            KindArg::User => RecordKind::User,
            KindArg::Case => RecordKind::Case,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Print the resolved preferences.
    Show,
    /// Store one preference (`language`, `timezone` or `date_format`).
    Set {
        key: String,
        value: String,
        /// Write the shared legacy entry instead of the signed-in user's.
        #[arg(long)]
        global: bool,
    },
}

/// Exact categorical value; `all` is not accepted.
fn categorical<T: Categorical + Send + Sync>(value: &str) -> Result<T, String> {
    T::from_name(value.trim()).ok_or_else(|| {
        let expected: Vec<_> = T::VARIANTS.iter().map(|v| v.as_str()).collect();
        format!(
            "unknown {} '{value}' (expected one of: {})",
            T::FIELD,
            expected.join(", ")
        )
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
