//! List screens: load, filter, paginate and render one page of records

use casedesk_client::{Activity, ArchivedUser, Case, Patient, RecordService, User};
use casedesk_listing::{
    Categorical, Criteria, FilterState, ListPage, ListView, PageItem, Searchable,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::num::NonZeroUsize;

use crate::error::Result;
use crate::format::Formatter;

/// Which collection a screen lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Active,
    /// Archived users, soft-deleted patients and cases.
    Archived,
}

/// A record that can be shown as a table row.
pub trait Row: Searchable + Serialize {
    const HEADERS: &'static [&'static str];

    fn cells(&self, fmt: &Formatter) -> Vec<String>;
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

impl Row for Patient {
    const HEADERS: &'static [&'static str] =
        &["ID", "CODE", "NAME", "GENDER", "DOB", "AGE", "DOCTOR", "CASES", "CREATED"];

    fn cells(&self, fmt: &Formatter) -> Vec<String> {
        vec![
            self.id.clone(),
            self.patient_code.clone(),
            self.full_name.clone(),
            self.gender.as_str().to_string(),
            self.dob.map_or_else(|| "-".to_string(), |d| fmt.calendar_date(d)),
            self.age.map_or_else(|| "-".to_string(), |a| a.to_string()),
            or_dash(self.assigned_doctor_name.as_deref()),
            self.total_cases.unwrap_or(0).to_string(),
            fmt.date(self.created_at),
        ]
    }
}

impl Row for User {
    const HEADERS: &'static [&'static str] =
        &["ID", "NAME", "EMAIL", "ROLE", "STATUS", "LAST LOGIN", "CREATED"];

    fn cells(&self, fmt: &Formatter) -> Vec<String> {
        vec![
            self.id.clone(),
            self.full_name.clone(),
            self.email.clone(),
            self.role.as_str().to_string(),
            self.status().as_str().to_string(),
            self.last_login
                .map_or_else(|| fmt.never().to_string(), |at| fmt.relative(at)),
            fmt.date(self.created_at),
        ]
    }
}

impl Row for ArchivedUser {
    const HEADERS: &'static [&'static str] =
        &["ARCHIVE ID", "NAME", "EMAIL", "ROLE", "ARCHIVED"];

    fn cells(&self, fmt: &Formatter) -> Vec<String> {
        vec![
            self.id.clone(),
            self.full_name.clone(),
            self.email.clone(),
            self.role.as_str().to_string(),
            fmt.date_time(self.archived_at),
        ]
    }
}

impl Row for Case {
    const HEADERS: &'static [&'static str] =
        &["ID", "CODE", "PATIENT", "DOCTOR", "STATUS", "RISK", "CREATED"];

    fn cells(&self, fmt: &Formatter) -> Vec<String> {
        let patient = match (self.patient_name.as_deref(), self.patient_code.as_deref()) {
            (Some(name), Some(code)) => format!("{name} ({code})"),
            (name, code) => or_dash(name.or(code)),
        };
        vec![
            self.id.clone(),
            or_dash(self.case_code.as_deref()),
            patient,
            or_dash(self.doctor_name.as_deref()),
            self.status.as_str().to_string(),
            self.risk_level
                .map_or_else(|| "-".to_string(), |r| r.as_str().to_string()),
            fmt.date(self.created_at),
        ]
    }
}

impl Row for Activity {
    const HEADERS: &'static [&'static str] = &["WHEN", "USER", "ACTION", "ENTITY", "DESCRIPTION"];

    fn cells(&self, fmt: &Formatter) -> Vec<String> {
        let user = match (self.user_name.as_deref(), self.user_role) {
            (Some(name), Some(role)) if !name.trim().is_empty() => {
                format!("{name} ({})", role.as_str())
            }
            (name, _) => name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("System")
                .to_string(),
        };
        vec![
            fmt.relative(self.created_at),
            user,
            self.action.as_str().to_string(),
            self.entity_type.as_str().to_string(),
            or_dash(self.description.as_deref()),
        ]
    }
}

pub async fn load_patients<S: RecordService + ?Sized>(
    service: &S,
    scope: Scope,
) -> Result<Vec<Patient>> {
    Ok(match scope {
        Scope::Active => service.list_patients().await?,
        Scope::Archived => service.list_archived_patients().await?,
    })
}

pub async fn load_cases<S: RecordService + ?Sized>(service: &S, scope: Scope) -> Result<Vec<Case>> {
    Ok(match scope {
        Scope::Active => service.list_cases().await?,
        Scope::Archived => service.list_deleted_cases().await?,
    })
}

pub async fn load_users<S: RecordService + ?Sized>(service: &S) -> Result<Vec<User>> {
    Ok(service.list_users().await?)
}

pub async fn load_archived_users<S: RecordService + ?Sized>(
    service: &S,
) -> Result<Vec<ArchivedUser>> {
    Ok(service.list_archived_users().await?)
}

pub async fn load_activities<S: RecordService + ?Sized>(service: &S) -> Result<Vec<Activity>> {
    Ok(service.list_activities().await?)
}

/// Build a list view positioned on `page`, clamped into range.
pub fn open_view<R, C>(
    records: Vec<R>,
    filter: FilterState<C>,
    page_size: NonZeroUsize,
    page: usize,
) -> ListView<R, C>
where
    R: Searchable,
    C: Criteria<R>,
{
    let mut view = ListView::new(records, filter, page_size);
    let landed = view.go_to(page);
    if landed != page {
        tracing::debug!(requested = page, landed, "Requested page clamped");
    }
    view
}

/// "Showing X–Y of N", or a placeholder when nothing matched.
pub fn summary_line<R>(page: &ListPage<'_, R>, noun: &str) -> String {
    if page.total_items == 0 {
        format!("No {noun} found.")
    } else {
        format!(
            "Showing {}–{} of {} {noun}",
            page.first_index, page.last_index, page.total_items
        )
    }
}

/// Page buttons with the current page bracketed, e.g. `1 … 4 [5] 6 … 10`.
pub fn button_line(current_page: usize, buttons: &[PageItem]) -> String {
    buttons
        .iter()
        .map(|item| match item {
            PageItem::Number(n) if *n == current_page => format!("[{n}]"),
            PageItem::Number(n) => n.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Plain-text rendering: table, summary and (when paginated) buttons.
pub fn render_text<R: Row>(page: &ListPage<'_, R>, noun: &str, fmt: &Formatter) -> String {
    let rows: Vec<Vec<String>> = page.rows.iter().map(|r| r.cells(fmt)).collect();
    let mut out = String::new();

    if !rows.is_empty() {
        out.push_str(&table(R::HEADERS, &rows));
        out.push('\n');
    }
    out.push_str(&summary_line(page, noun));

    if !page.buttons.is_empty() {
        let _ = write!(
            out,
            "\nPage {} of {}: {}",
            page.current_page,
            page.total_pages,
            button_line(page.current_page, &page.buttons)
        );
    }
    out
}

#[derive(Serialize)]
struct JsonPage<'p, 'a, R> {
    rows: &'p [&'a R],
    current_page: usize,
    total_pages: usize,
    total_items: usize,
    first_index: usize,
    last_index: usize,
    buttons: &'p [PageItem],
}

/// JSON rendering of the same page for scripting.
pub fn render_json<R: Row>(page: &ListPage<'_, R>) -> Result<String> {
    let doc = JsonPage {
        rows: &page.rows,
        current_page: page.current_page,
        total_pages: page.total_pages,
        total_items: page.total_items,
        first_index: page.first_index,
        last_index: page.last_index,
        buttons: &page.buttons,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(table_line(headers.iter().copied(), &widths));
    for row in rows {
        lines.push(table_line(row.iter().map(String::as_str), &widths));
    }
    lines.join("\n")
}

fn table_line<'c>(cells: impl Iterator<Item = &'c str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
