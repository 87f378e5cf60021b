//! Time-derived names: feature branch names and the marker line.
use chrono::{DateTime, Utc};

/// Format used for the branch name suffix, second granularity.
pub const BRANCH_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Format used for the timestamp written into the marker file.
pub const MARKER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Leading text of every marker line.
pub const MARKER_PREFIX: &str = "# Automated comment added at:";

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// `<prefix>_<YYYYMMDD_HHMMSS>`
pub fn branch_name(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix}_{}", now.format(BRANCH_TIMESTAMP_FORMAT))
}

/// `# Automated comment added at: <UTC timestamp>`
pub fn marker_line(now: DateTime<Utc>) -> String {
    format!("{MARKER_PREFIX} {}", now.format(MARKER_TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 2).unwrap()
    }

    #[test]
    fn formats_branch_name() {
        assert_eq!(
            branch_name("rehearsal", instant()),
            "rehearsal_20240309_070502"
        );
    }

    #[test]
    fn branch_names_one_second_apart_are_distinct() {
        let first = branch_name("rehearsal", instant());
        let second =
            branch_name("rehearsal", instant() + Duration::seconds(1));
        assert_ne!(first, second);
    }

    #[test]
    fn formats_marker_line() {
        assert_eq!(
            marker_line(instant()),
            "# Automated comment added at: 2024-03-09 07:05:02 UTC"
        );
    }

    #[test]
    fn fixed_clock_is_frozen() {
        let clock = FixedClock(instant());
        assert_eq!(clock.now(), clock.now());
    }
}
