//! Command execution

use casedesk_client::{
    ApiClient, AuthService, NewCase, NewPatient, NewUser, PatientUpdate, ProfileUpdate, RecordKind,
    UserUpdate,
};
use casedesk_listing::{FilterState, ListView};
use serde::Serialize;
use serde_json::json;
use std::num::NonZeroUsize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::account;
use crate::actions::{Action, ActionRunner, BannerKind, Outcome};
use crate::cli::{
    ActivityArgs, CasesArgs, CasesCommand, Cli, Command, ListArgs, PasswordCommand, PatientsArgs,
    PatientsCommand, PrefsCommand, ProfileCommand, TargetArgs, UsersArgs, UsersCommand,
};
use crate::config::Config;
use crate::dashboard::{self, DashboardStats};
use crate::error::{Error, Result};
use crate::filters::{
    ActivityCriteria, ArchivedUserCriteria, CaseCriteria, PatientCriteria, UserCriteria,
};
use crate::format::Formatter;
use crate::login::{LoginFlow, LoginState, Password};
use crate::preferences::{PreferenceKey, PreferenceStore};
use crate::screens::{self, Row, Scope};
use crate::session::{Session, SessionStore};

/// Everything a command needs, built once from configuration.
pub struct Console {
    config: Config,
    json: bool,
    sessions: SessionStore,
    prompt: Prompt,
}

impl Console {
    /// `config` must already carry the command-line overrides and be validated.
    pub fn new(config: Config, cli: &Cli) -> Self {
        let sessions = SessionStore::new(config.session.resolved_path());
        Self {
            config,
            json: cli.json,
            sessions,
            prompt: Prompt::stdin(),
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        let logging_in = matches!(command, Command::Login { .. });
        let result = match command {
            Command::Login { email, password } => self.login(&email, password).await,
            Command::Logout => self.logout().await,
            Command::Whoami => self.whoami().await,
            Command::Patients(args) => self.patients(args).await,
            Command::Users(args) => self.users(args).await,
            Command::Cases(args) => self.cases(args).await,
            Command::Archive(target) => self.target_action(target, ActionVerb::Archive).await,
            Command::Restore(target) => self.target_action(target, ActionVerb::Restore).await,
            Command::Purge { target, yes } => {
                if !yes && !self.confirm_purge(&target).await? {
                    eprintln!("Cancelled.");
                    return Ok(());
                }
                self.target_action(target, ActionVerb::Purge).await
            }
            Command::Prefs { command } => self.prefs(command).await,
            Command::Dashboard => self.dashboard().await,
            Command::Activity(args) => self.activity(args).await,
            Command::Password { command } => self.password(command).await,
            Command::Profile { command } => self.profile(command).await,
        };

        match result {
            Err(Error::Client(e)) if e.is_unauthorized() && !logging_in => {
                Err(Error::SessionExpired)
            }
            other => other,
        }
    }

    fn client(&self) -> Result<ApiClient> {
        Ok(ApiClient::new(
            &self.config.api.base_url,
            self.config.api.timeout(),
        )?)
    }

    fn session(&self) -> Result<Session> {
        self.sessions.load()?.ok_or(Error::NotLoggedIn)
    }

    fn authorized_client(&self) -> Result<(ApiClient, Session)> {
        let session = self.session()?;
        let client = self.client()?.with_token(&session.tokens.access);
        Ok((client, session))
    }

    fn formatter(&self, session: Option<&Session>) -> Result<Formatter> {
        let store = PreferenceStore::open(self.config.preferences.resolved_path())?;
        let prefs = store.resolve(session.map(|s| s.user.id.as_str()));
        Ok(Formatter::new(prefs))
    }

    fn page_size(&self, list: &ListArgs) -> Result<NonZeroUsize> {
        match list.page_size {
            Some(size) => NonZeroUsize::new(size)
                .ok_or_else(|| Error::InvalidInput("--page-size must be greater than 0".into())),
            None => Ok(self.config.listing.page_size()),
        }
    }

    // ---- auth ----

    async fn login(&mut self, email: &str, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(p) => p,
            None => self.prompt.ask("Password: ").await?,
        };

        let mut flow = LoginFlow::new(self.client()?, self.config.auth.two_factor_fail_open);
        flow.submit_credentials(email, Password::new(password)).await;

        loop {
            match flow.state() {
                LoginState::LoggedIn(_) => break,
                LoginState::AwaitingCode { email, notice } => {
                    let line = match notice {
                        Some(notice) => notice.clone(),
                        None => format!("A verification code has been sent to {email}."),
                    };
                    eprintln!("{line}");
                    let input = self
                        .prompt
                        .ask("Verification code ('r' to resend, 'q' to cancel): ")
                        .await?;
                    match input.trim() {
                        "q" | "Q" => {
                            flow.back();
                            return Err(Error::InvalidInput("Login cancelled".into()));
                        }
                        "r" | "R" => {
                            flow.resend_code().await;
                        }
                        code => {
                            flow.submit_code(code).await;
                        }
                    }
                }
                LoginState::Error { message, .. } => return Err(Error::Login(message.clone())),
                other => {
                    return Err(Error::Login(format!(
                        "Login stopped in unexpected state '{}'",
                        other.name()
                    )))
                }
            }
        }

        let Some(session) = flow.into_session() else {
            return Err(Error::Login("Login did not complete".into()));
        };
        self.sessions.save(&session)?;

        if self.json {
            print_json(&session.user)?;
        } else {
            println!(
                "Logged in as {} <{}> ({})",
                session.user.full_name,
                session.user.email,
                casedesk_listing::Categorical::as_str(&session.user.role)
            );
        }
        Ok(())
    }

    async fn logout(&mut self) -> Result<()> {
        let Some(session) = self.sessions.load()? else {
            println!("Not logged in.");
            return Ok(());
        };

        if let Err(e) = self.client()?.logout(&session.tokens).await {
            tracing::warn!(error = %e, "Token revocation failed; clearing local session anyway");
        }
        self.sessions.clear()?;
        println!("Logged out.");
        Ok(())
    }

    async fn whoami(&mut self) -> Result<()> {
        let mut session = self.session()?;
        match self.client()?.current_user(&session.tokens).await {
            Ok(user) => {
                if user != session.user {
                    session.user = user;
                    self.sessions.save(&session)?;
                }
            }
            Err(e) if e.is_unauthorized() => return Err(Error::SessionExpired),
            Err(e) => tracing::warn!(error = %e, "Could not refresh profile; showing stored copy"),
        }

        let fmt = self.formatter(Some(&session))?;
        if self.json {
            return print_json(&json!({
                "user": session.user,
                "preferences": fmt.preferences(),
            }));
        }

        let user = &session.user;
        println!("{} <{}>", user.full_name, user.email);
        println!("  id:          {}", user.id);
        println!(
            "  role:        {}",
            casedesk_listing::Categorical::as_str(&user.role)
        );
        println!(
            "  two-factor:  {}",
            if user.two_factor_enabled { "enabled" } else { "disabled" }
        );
        println!(
            "  last login:  {}",
            user.last_login
                .map_or_else(|| fmt.never().to_string(), |at| fmt.date_time(at))
        );
        Ok(())
    }

    async fn password(&mut self, command: PasswordCommand) -> Result<()> {
        let message = match command {
            PasswordCommand::Forgot { email } => {
                account::forgot_password(&self.client()?, &email).await?
            }
            PasswordCommand::Reset {
                email,
                token,
                new_password,
            } => {
                let new_password = self.new_password(new_password).await?;
                account::reset_password(&self.client()?, &email, &token, &new_password).await?
            }
            PasswordCommand::Change {
                old_password,
                new_password,
            } => {
                let session = self.session()?;
                let old_password = match old_password {
                    Some(p) => Password::new(p),
                    None => Password::new(self.prompt.ask("Current password: ").await?),
                };
                let new_password = self.new_password(new_password).await?;
                account::change_password(&self.client()?, &session, &old_password, &new_password)
                    .await?
            }
        };
        self.report(&message)
    }

    /// New password from the command line, else prompted twice.
    async fn new_password(&mut self, given: Option<String>) -> Result<Password> {
        if let Some(password) = given {
            return Ok(Password::new(password));
        }
        let password = Password::new(self.prompt.ask("New password: ").await?);
        let confirmation = Password::new(self.prompt.ask("Confirm new password: ").await?);
        account::check_new_password(&password, Some(&confirmation))?;
        Ok(password)
    }

    async fn profile(&mut self, command: ProfileCommand) -> Result<()> {
        let ProfileCommand::Update {
            full_name,
            email,
            phone,
            two_factor,
        } = command;
        let update = ProfileUpdate {
            full_name,
            email,
            phone_number: phone,
            two_factor_enabled: two_factor,
        };

        let mut session = self.session()?;
        let message = account::update_profile(&self.client()?, &mut session, &update).await?;
        self.sessions.save(&session)?;

        if self.json {
            print_json(&json!({ "ok": true, "message": message, "user": session.user }))
        } else {
            println!("{message}");
            Ok(())
        }
    }

    fn report(&self, message: &str) -> Result<()> {
        if self.json {
            print_json(&json!({ "ok": true, "message": message }))
        } else {
            println!("{message}");
            Ok(())
        }
    }

    // ---- lists ----

    async fn patients(&mut self, args: PatientsArgs) -> Result<()> {
        if let Some(command) = args.command {
            return self.patients_command(command).await;
        }

        let (client, session) = self.authorized_client()?;
        let scope = scope(&args.list);
        let records = screens::load_patients(&client, scope).await?;
        let view = screens::open_view(
            records,
            FilterState::new(args.list.search.clone(), PatientCriteria { gender: args.gender }),
            self.page_size(&args.list)?,
            args.list.page,
        );
        let noun = match scope {
            Scope::Active => "patients",
            Scope::Archived => "deleted patients",
        };
        self.show(&view, noun, &session)
    }

    async fn users(&mut self, args: UsersArgs) -> Result<()> {
        if let Some(command) = args.command {
            return self.users_command(command).await;
        }

        let (client, session) = self.authorized_client()?;
        let page_size = self.page_size(&args.list)?;
        match scope(&args.list) {
            Scope::Active => {
                let records = screens::load_users(&client).await?;
                let criteria = UserCriteria {
                    role: args.role,
                    status: args.status,
                };
                let view = screens::open_view(
                    records,
                    FilterState::new(args.list.search.clone(), criteria),
                    page_size,
                    args.list.page,
                );
                self.show(&view, "users", &session)
            }
            Scope::Archived => {
                if !args.status.is_all() {
                    return Err(Error::InvalidInput(
                        "--status is not available for archived users".into(),
                    ));
                }
                let records = screens::load_archived_users(&client).await?;
                let view = screens::open_view(
                    records,
                    FilterState::new(
                        args.list.search.clone(),
                        ArchivedUserCriteria { role: args.role },
                    ),
                    page_size,
                    args.list.page,
                );
                self.show(&view, "archived users", &session)
            }
        }
    }

    async fn cases(&mut self, args: CasesArgs) -> Result<()> {
        if let Some(command) = args.command {
            return self.cases_command(command).await;
        }

        let (client, session) = self.authorized_client()?;
        let scope = scope(&args.list);
        let records = screens::load_cases(&client, scope).await?;
        let criteria = CaseCriteria {
            status: args.status,
            risk_level: args.risk_level,
        };
        let view = screens::open_view(
            records,
            FilterState::new(args.list.search.clone(), criteria),
            self.page_size(&args.list)?,
            args.list.page,
        );
        let noun = match scope {
            Scope::Active => "cases",
            Scope::Archived => "deleted cases",
        };
        self.show(&view, noun, &session)
    }

    async fn activity(&mut self, args: ActivityArgs) -> Result<()> {
        if args.list.archived {
            return Err(Error::InvalidInput(
                "--archived is not available for the activity feed".into(),
            ));
        }

        let (client, session) = self.authorized_client()?;
        let records = screens::load_activities(&client).await?;
        let criteria = ActivityCriteria {
            action: args.action,
            entity_type: args.entity_type,
        };
        let view = screens::open_view(
            records,
            FilterState::new(args.list.search.clone(), criteria),
            self.page_size(&args.list)?,
            args.list.page,
        );
        self.show(&view, "activities", &session)
    }

    async fn dashboard(&mut self) -> Result<()> {
        let (client, session) = self.authorized_client()?;
        let stats = DashboardStats::collect(&client).await?;
        if self.json {
            return print_json(&stats);
        }
        let fmt = self.formatter(Some(&session))?;
        println!("{}", dashboard::render_text(&stats, &fmt));
        Ok(())
    }

    fn show<R, C>(&self, view: &ListView<R, C>, noun: &str, session: &Session) -> Result<()>
    where
        R: Row,
        C: casedesk_listing::Criteria<R>,
    {
        let page = view.page();
        if self.json {
            println!("{}", screens::render_json(&page)?);
        } else {
            let fmt = self.formatter(Some(session))?;
            println!("{}", screens::render_text(&page, noun, &fmt));
        }
        Ok(())
    }

    // ---- mutations ----

    async fn patients_command(&mut self, command: PatientsCommand) -> Result<()> {
        let action = match command {
            PatientsCommand::Create {
                full_name,
                identity_number,
                gender,
                phone,
                dob,
                email,
                address,
                doctor,
            } => Action::Create(serde_json::to_value(NewPatient {
                full_name,
                identity_number,
                gender,
                phone_number: phone,
                dob,
                email,
                address,
                assigned_doctor: doctor,
            })?),
            PatientsCommand::Update {
                id,
                full_name,
                phone,
                email,
                address,
                doctor,
            } => Action::Update {
                id,
                body: non_empty_update(PatientUpdate {
                    full_name,
                    phone_number: phone,
                    email,
                    address,
                    assigned_doctor: doctor,
                })?,
            },
        };
        self.perform(RecordKind::Patient, action).await
    }

    async fn users_command(&mut self, command: UsersCommand) -> Result<()> {
        let action = match command {
            UsersCommand::Create {
                full_name,
                email,
                role,
                password,
            } => {
                let password = match password {
                    Some(p) => p,
                    None => self.prompt.ask("Initial password: ").await?,
                };
                Action::Create(serde_json::to_value(NewUser {
                    full_name,
                    email,
                    password,
                    role,
                })?)
            }
            UsersCommand::Update {
                id,
                full_name,
                email,
                phone,
                role,
                active,
            } => Action::Update {
                id,
                body: non_empty_update(UserUpdate {
                    full_name,
                    email,
                    phone_number: phone,
                    role,
                    is_active: active,
                })?,
            },
        };
        self.perform(RecordKind::User, action).await
    }

    async fn cases_command(&mut self, command: CasesCommand) -> Result<()> {
        let CasesCommand::Create { patient, notes } = command;
        let body = serde_json::to_value(NewCase { patient, notes })?;
        self.perform(RecordKind::Case, Action::Create(body)).await
    }

    async fn target_action(&mut self, target: TargetArgs, verb: ActionVerb) -> Result<()> {
        let id = target.id;
        let action = match verb {
            ActionVerb::Archive => Action::Archive { id },
            ActionVerb::Restore => Action::Restore { id },
            ActionVerb::Purge => Action::Purge { id },
        };
        self.perform(target.kind.into(), action).await
    }

    async fn perform(&mut self, kind: RecordKind, action: Action) -> Result<()> {
        let (client, _session) = self.authorized_client()?;
        let runner = ActionRunner::new(client, self.config.feedback.banner_ttl());
        let outcome = runner.run(kind, action).await;

        if self.json {
            print_json(&OutcomeJson::from(&outcome))?;
        } else if let Some(banner) = runner.banner() {
            // Failure banners reach the operator through the returned error.
            if banner.kind == BannerKind::Success {
                println!("{}", banner.text);
            }
        }

        outcome_result(outcome)
    }

    async fn confirm_purge(&mut self, target: &TargetArgs) -> Result<bool> {
        let kind = RecordKind::from(target.kind);
        let answer = self
            .prompt
            .ask(&format!(
                "Permanently delete {kind} {}? This cannot be undone. [y/N] ",
                target.id
            ))
            .await?;
        Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
    }

    // ---- preferences ----

    async fn prefs(&mut self, command: PrefsCommand) -> Result<()> {
        let session = self.sessions.load()?;
        let user_id = session.as_ref().map(|s| s.user.id.clone());
        let mut store = PreferenceStore::open(self.config.preferences.resolved_path())?;

        match command {
            PrefsCommand::Show => {
                let prefs = store.resolve(user_id.as_deref());
                if self.json {
                    print_json(&prefs)?;
                } else {
                    println!("language:     {}", prefs.language);
                    println!("timezone:     {}", prefs.timezone);
                    println!("date_format:  {}", prefs.date_format);
                }
            }
            PrefsCommand::Set { key, value, global } => {
                let key: PreferenceKey = key.parse()?;
                let scope = if global { None } else { user_id.as_deref() };
                store.set(scope, key, &value)?;
                store.save()?;
                println!(
                    "Saved {} preference to {}.",
                    if scope.is_some() { "user" } else { "global" },
                    store.path().display()
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum ActionVerb {
    Archive,
    Restore,
    Purge,
}

fn scope(list: &ListArgs) -> Scope {
    if list.archived {
        Scope::Archived
    } else {
        Scope::Active
    }
}

/// Map a finished action onto the command result; the error carries the
/// same text the failure banner shows.
fn outcome_result(outcome: Outcome) -> Result<()> {
    match outcome {
        Outcome::Succeeded { .. } => Ok(()),
        Outcome::Failed {
            message,
            conflict_fields,
        } => Err(Error::ActionFailed(crate::actions::failure_text(
            &message,
            &conflict_fields,
        ))),
        Outcome::Busy => Err(Error::ActionFailed(BUSY_MESSAGE.into())),
    }
}

const BUSY_MESSAGE: &str = "Another action on this record is still in progress";

/// Reject updates that would send an empty body.
fn non_empty_update<T: Serialize>(update: T) -> Result<serde_json::Value> {
    let body = serde_json::to_value(update)?;
    if body.as_object().is_some_and(|fields| fields.is_empty()) {
        return Err(Error::InvalidInput("Nothing to update; pass at least one field".into()));
    }
    Ok(body)
}

#[derive(Serialize)]
struct OutcomeJson<'a> {
    ok: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "no_fields")]
    conflict_fields: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    receipt: Option<&'a casedesk_client::ActionReceipt>,
}

impl<'a> From<&'a Outcome> for OutcomeJson<'a> {
    fn from(outcome: &'a Outcome) -> Self {
        match outcome {
            Outcome::Succeeded { message, receipt } => Self {
                ok: true,
                message,
                conflict_fields: &[],
                receipt: Some(receipt),
            },
            Outcome::Failed {
                message,
                conflict_fields,
            } => Self {
                ok: false,
                message,
                conflict_fields,
                receipt: None,
            },
            Outcome::Busy => Self {
                ok: false,
                message: BUSY_MESSAGE,
                conflict_fields: &[],
                receipt: None,
            },
        }
    }
}

fn no_fields(fields: &&[String]) -> bool {
    fields.is_empty()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Line-oriented prompt on stdin; prompts are written to stderr.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    async fn ask(&mut self, question: &str) -> Result<String> {
        let mut stderr = tokio::io::stderr();
        stderr.write_all(question.as_bytes()).await?;
        stderr.flush().await?;
        match self.lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(Error::InvalidInput("No input provided".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_update_is_rejected() {
        assert!(non_empty_update(UserUpdate::default()).is_err());
        let body = non_empty_update(UserUpdate {
            is_active: Some(false),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, json!({"is_active": false}));
    }

    #[test]
    fn outcome_json_shapes() {
        let failed = Outcome::Failed {
            message: "Cannot restore".into(),
            conflict_fields: vec!["email".into()],
        };
        assert_eq!(
            serde_json::to_value(OutcomeJson::from(&failed)).unwrap(),
            json!({"ok": false, "message": "Cannot restore", "conflict_fields": ["email"]})
        );

        assert_eq!(
            serde_json::to_value(OutcomeJson::from(&Outcome::Busy)).unwrap()["ok"],
            false
        );
    }

    #[test]
    fn failed_outcome_error_carries_banner_text() {
        let failed = Outcome::Failed {
            message: "Cannot restore".into(),
            conflict_fields: vec!["email".into()],
        };
        let banner = crate::actions::failure_text("Cannot restore", &["email".to_string()]);
        match outcome_result(failed) {
            Err(Error::ActionFailed(text)) => assert_eq!(text, banner),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(matches!(
            outcome_result(Outcome::Busy),
            Err(Error::ActionFailed(text)) if text == BUSY_MESSAGE
        ));
    }

    #[test]
    fn archived_flag_selects_scope() {
        let mut list = ListArgs {
            search: String::new(),
            page: 1,
            page_size: None,
            archived: false,
        };
        assert_eq!(scope(&list), Scope::Active);
        list.archived = true;
        assert_eq!(scope(&list), Scope::Archived);
    }
}
