//! Display preferences
//!
//! Preferences are stored in a JSON document with one legacy `global` entry
//! and one entry per user id. Each field resolves independently: the user's
//! value, else the legacy value, else the built-in default. The resolved
//! [`Preferences`] are computed once per command and passed to whatever
//! formats output.

use chrono::{FixedOffset, Offset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

pub const DEFAULT_LANGUAGE: &str = "en";

/// Resolved preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preferences {
    pub language: String,
    pub timezone: TimeZoneSetting,
    pub date_format: DateFormat,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            timezone: TimeZoneSetting::Utc,
            date_format: DateFormat::DayMonthYear,
        }
    }
}

/// Timezone used when rendering timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TimeZoneSetting {
    Utc,
    /// The machine's local timezone.
    Local,
    Fixed(FixedOffset),
}

impl TimeZoneSetting {
    /// Offset in effect at the current instant.
    pub fn offset(&self) -> FixedOffset {
        match self {
            Self::Utc => chrono::Utc.fix(),
            Self::Local => chrono::Local::now().offset().fix(),
            Self::Fixed(offset) => *offset,
        }
    }
}

impl FromStr for TimeZoneSetting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
            return Ok(Self::Utc);
        }
        if trimmed.eq_ignore_ascii_case("local") {
            return Ok(Self::Local);
        }
        parse_offset(trimmed).map(Self::Fixed).ok_or_else(|| {
            Error::InvalidInput(format!(
                "Unknown timezone '{trimmed}' (expected UTC, local or an offset such as +08:00)"
            ))
        })
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || !(0..60).contains(&minutes) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl fmt::Display for TimeZoneSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Utc => f.write_str("UTC"),
            Self::Local => f.write_str("local"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}

impl TryFrom<String> for TimeZoneSetting {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TimeZoneSetting> for String {
    fn from(value: TimeZoneSetting) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateFormat {
    #[serde(rename = "DD/MM/YYYY")]
    DayMonthYear,
    #[serde(rename = "MM/DD/YYYY")]
    MonthDayYear,
    #[serde(rename = "YYYY-MM-DD")]
    Iso,
}

impl DateFormat {
    pub const ALL: [Self; 3] = [Self::DayMonthYear, Self::MonthDayYear, Self::Iso];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DayMonthYear => "DD/MM/YYYY",
            Self::MonthDayYear => "MM/DD/YYYY",
            Self::Iso => "YYYY-MM-DD",
        }
    }

    /// `chrono` format string for the date part.
    pub fn pattern(&self) -> &'static str {
        match self {
            Self::DayMonthYear => "%d/%m/%Y",
            Self::MonthDayYear => "%m/%d/%Y",
            Self::Iso => "%Y-%m-%d",
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Unknown date format '{trimmed}' (expected one of: DD/MM/YYYY, MM/DD/YYYY, YYYY-MM-DD)"
                ))
            })
    }
}

/// One stored entry; unset fields defer to the next scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<TimeZoneSetting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<DateFormat>,
}

/// Preference key accepted by [`PreferenceStore::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceKey {
    Language,
    Timezone,
    DateFormat,
}

impl FromStr for PreferenceKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "language" => Ok(Self::Language),
            "timezone" => Ok(Self::Timezone),
            "date_format" => Ok(Self::DateFormat),
            other => Err(Error::InvalidInput(format!(
                "Unknown preference '{other}' (expected one of: language, timezone, date_format)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    global: Option<StoredPreferences>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    users: BTreeMap<String, StoredPreferences>,
}

/// File-backed preference store.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
    doc: Document,
}

impl PreferenceStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let doc = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Document::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve every field for `user_id` (or only the legacy entry when no
    /// user is known).
    pub fn resolve(&self, user_id: Option<&str>) -> Preferences {
        let user = user_id.and_then(|id| self.doc.users.get(id));
        let global = self.doc.global.as_ref();
        let defaults = Preferences::default();

        Preferences {
            language: user
                .and_then(|p| p.language.clone())
                .or_else(|| global.and_then(|p| p.language.clone()))
                .unwrap_or(defaults.language),
            timezone: user
                .and_then(|p| p.timezone)
                .or_else(|| global.and_then(|p| p.timezone))
                .unwrap_or(defaults.timezone),
            date_format: user
                .and_then(|p| p.date_format)
                .or_else(|| global.and_then(|p| p.date_format))
                .unwrap_or(defaults.date_format),
        }
    }

    /// Set one preference for `user_id`, or in the legacy entry when no user
    /// is given. Values are validated before anything is stored.
    pub fn set(&mut self, user_id: Option<&str>, key: PreferenceKey, value: &str) -> Result<()> {
        let mut update = StoredPreferences::default();
        match key {
            PreferenceKey::Language => {
                let language = value.trim();
                if language.is_empty() {
                    return Err(Error::InvalidInput("Language must not be empty".into()));
                }
                update.language = Some(language.to_string());
            }
            PreferenceKey::Timezone => update.timezone = Some(value.parse()?),
            PreferenceKey::DateFormat => update.date_format = Some(value.parse()?),
        }

        let entry = match user_id {
            Some(id) => self.doc.users.entry(id.to_string()).or_default(),
            None => self.doc.global.get_or_insert_with(Default::default),
        };
        entry.language = update.language.or(entry.language.take());
        entry.timezone = update.timezone.or(entry.timezone);
        entry.date_format = update.date_format.or(entry.date_format);

        tracing::debug!(user_id, ?key, value, "Preference updated");
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&self.doc)?)?;
        Ok(())
    }
}
