use anyhow::{Result, anyhow, bail};
use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Canonical rendering handed to the query and written to the report.
pub const CANONICAL_FORMAT: &str = "%Y%m%d%H%M%S";

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", CANONICAL_FORMAT];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Half-open reporting window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if end < start {
            bail!("time window ends ({end}) before it starts ({start})");
        }
        Ok(Self { start, end })
    }

    /// Midnight yesterday to midnight today.
    pub fn previous_day(now: NaiveDateTime) -> Self {
        let end = now.date().and_time(NaiveTime::MIN);
        let start = end
            .checked_sub_days(Days::new(1))
            .unwrap_or(end);
        Self { start, end }
    }

    /// Explicit bounds win when both are given; one without the other is an error.
    pub fn resolve(start: Option<&str>, end: Option<&str>, now: NaiveDateTime) -> Result<Self> {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());
        match (start, end) {
            (Some(start), Some(end)) => Self::new(parse_time(start)?, parse_time(end)?),
            (None, None) => Ok(Self::previous_day(now)),
            _ => bail!("start_time and end_time must be given together"),
        }
    }

    pub fn start_text(&self) -> String {
        self.start.format(CANONICAL_FORMAT).to_string()
    }

    pub fn end_text(&self) -> String {
        self.end.format(CANONICAL_FORMAT).to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start_text(), self.end_text())
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD` or `YYYYMMDDHHMMSS`.
pub fn parse_time(text: &str) -> Result<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(parsed);
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| {
            anyhow!(
                "unrecognized time '{text}' (expected YYYY-MM-DD HH:MM:SS, YYYY-MM-DD or YYYYMMDDHHMMSS)"
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(text: &str) -> NaiveDateTime {
        parse_time(text).unwrap()
    }

    #[test]
    fn accepts_all_three_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(at("2024-03-05 00:00:00"), expected);
        assert_eq!(at("2024-03-05"), expected);
        assert_eq!(at("20240305000000"), expected);
        assert!(parse_time("05/03/2024").is_err());
    }

    #[test]
    fn default_window_is_previous_day() {
        let window = TimeWindow::resolve(None, None, at("2024-03-01 09:00:00")).unwrap();
        assert_eq!(window.start_text(), "20240229000000");
        assert_eq!(window.end_text(), "20240301000000");
    }

    #[test]
    fn half_given_window_is_rejected() {
        let now = at("2024-03-01 09:00:00");
        assert!(TimeWindow::resolve(Some("2024-01-01"), None, now).is_err());
        assert!(TimeWindow::resolve(Some("2024-01-02"), Some("2024-01-01"), now).is_err());
    }
}
