//! Timestamp rendering driven by [`Preferences`]

use chrono::{DateTime, NaiveDate, Utc};

use crate::preferences::Preferences;

/// Relative labels are used for instants less than this many days old.
const RELATIVE_DAYS: i64 = 7;

/// Languages with translated labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Malay,
}

impl Language {
    /// Match on the primary subtag (`ms-MY` is Malay); anything unknown is English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag.trim().split(['-', '_']).next().unwrap_or_default();
        if primary.eq_ignore_ascii_case("ms") {
            Self::Malay
        } else {
            Self::English
        }
    }

    fn just_now(self) -> &'static str {
        match self {
            Self::English => "just now",
            Self::Malay => "baru sahaja",
        }
    }

    fn never(self) -> &'static str {
        match self {
            Self::English => "never",
            Self::Malay => "tidak pernah",
        }
    }

    fn ago(self, count: i64, unit: Unit) -> String {
        match self {
            Self::English => {
                let unit = match unit {
                    Unit::Minute => "minute",
                    Unit::Hour => "hour",
                    Unit::Day => "day",
                };
                if count == 1 {
                    format!("1 {unit} ago")
                } else {
                    format!("{count} {unit}s ago")
                }
            }
            Self::Malay => {
                let unit = match unit {
                    Unit::Minute => "minit",
                    Unit::Hour => "jam",
                    Unit::Day => "hari",
                };
                format!("{count} {unit} lalu")
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Minute,
    Hour,
    Day,
}

/// Formats timestamps for display.
#[derive(Debug, Clone)]
pub struct Formatter {
    prefs: Preferences,
    language: Language,
}

impl Formatter {
    pub fn new(prefs: Preferences) -> Self {
        let language = Language::from_tag(&prefs.language);
        Self { prefs, language }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Label for an instant that never happened, e.g. a user's first login.
    pub fn never(&self) -> &'static str {
        self.language.never()
    }

    pub fn date(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.prefs.timezone.offset())
            .format(self.prefs.date_format.pattern())
            .to_string()
    }

    pub fn date_time(&self, at: DateTime<Utc>) -> String {
        let pattern = format!("{} %H:%M", self.prefs.date_format.pattern());
        at.with_timezone(&self.prefs.timezone.offset())
            .format(&pattern)
            .to_string()
    }

    /// Calendar dates carry no timezone and are only reformatted.
    pub fn calendar_date(&self, date: NaiveDate) -> String {
        date.format(self.prefs.date_format.pattern()).to_string()
    }

    pub fn relative(&self, at: DateTime<Utc>) -> String {
        self.relative_to(at, Utc::now())
    }

    /// "just now", "N minutes ago", "N hours ago" or "N days ago" (in the
    /// preferred language) for instants within the last week; the formatted
    /// date otherwise.
    pub fn relative_to(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> String {
        let elapsed = now.signed_duration_since(at);
        if elapsed.num_seconds() < 0 || elapsed.num_days() >= RELATIVE_DAYS {
            return self.date(at);
        }

        let language = self.language;
        if elapsed.num_seconds() < 60 {
            language.just_now().to_string()
        } else if elapsed.num_minutes() < 60 {
            language.ago(elapsed.num_minutes(), Unit::Minute)
        } else if elapsed.num_hours() < 24 {
            language.ago(elapsed.num_hours(), Unit::Hour)
        } else {
            language.ago(elapsed.num_days(), Unit::Day)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::{DateFormat, TimeZoneSetting};
    use chrono::{Duration, FixedOffset, TimeZone};

    fn formatter(date_format: DateFormat, timezone: TimeZoneSetting) -> Formatter {
        Formatter::new(Preferences {
            date_format,
            timezone,
            ..Default::default()
        })
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 20, 30, 0).unwrap()
    }

    #[test]
    fn date_honours_format_and_timezone() {
        let utc = formatter(DateFormat::DayMonthYear, TimeZoneSetting::Utc);
        assert_eq!(utc.date(at()), "01/03/2025");

        let kl = formatter(
            DateFormat::Iso,
            TimeZoneSetting::Fixed(FixedOffset::east_opt(8 * 3600).unwrap()),
        );
        assert_eq!(kl.date(at()), "2025-03-02");
        assert_eq!(kl.date_time(at()), "2025-03-02 04:30");

        let us = formatter(DateFormat::MonthDayYear, TimeZoneSetting::Utc);
        assert_eq!(us.date(at()), "03/01/2025");
        assert_eq!(
            us.calendar_date(NaiveDate::from_ymd_opt(1990, 1, 31).unwrap()),
            "01/31/1990"
        );
    }

    #[test]
    fn relative_labels() {
        let f = formatter(DateFormat::Iso, TimeZoneSetting::Utc);
        let now = at();
        assert_eq!(f.relative_to(now - Duration::seconds(59), now), "just now");
        assert_eq!(f.relative_to(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(f.relative_to(now - Duration::minutes(59), now), "59 minutes ago");
        assert_eq!(f.relative_to(now - Duration::hours(1), now), "1 hour ago");
        assert_eq!(f.relative_to(now - Duration::hours(23), now), "23 hours ago");
        assert_eq!(f.relative_to(now - Duration::days(6), now), "6 days ago");
        assert_eq!(f.relative_to(now - Duration::days(7), now), "2025-02-22");
    }

    #[test]
    fn relative_labels_follow_language() {
        let malay = Formatter::new(Preferences {
            language: "ms-MY".into(),
            date_format: DateFormat::Iso,
            timezone: TimeZoneSetting::Utc,
        });
        let now = at();
        assert_eq!(malay.language(), Language::Malay);
        assert_eq!(malay.relative_to(now - Duration::seconds(5), now), "baru sahaja");
        assert_eq!(malay.relative_to(now - Duration::minutes(1), now), "1 minit lalu");
        assert_eq!(malay.relative_to(now - Duration::hours(3), now), "3 jam lalu");
        assert_eq!(malay.relative_to(now - Duration::days(2), now), "2 hari lalu");
        assert_eq!(malay.relative_to(now - Duration::days(9), now), "2025-02-20");
        assert_eq!(malay.never(), "tidak pernah");

        let unknown = Formatter::new(Preferences {
            language: "fr".into(),
            ..Default::default()
        });
        assert_eq!(unknown.language(), Language::English);
        assert_eq!(unknown.relative_to(now - Duration::hours(2), now), "2 hours ago");
        assert_eq!(unknown.never(), "never");
    }

    #[test]
    fn future_instants_render_as_dates() {
        let f = formatter(DateFormat::Iso, TimeZoneSetting::Utc);
        assert_eq!(f.relative_to(at() + Duration::minutes(5), at()), "2025-03-01");
    }
}
