use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Point in time used for validity bounds and as-of queries.
pub type Timestamp = DateTime<Utc>;

/// Render a timestamp in the ISO-8601 form used in document front matter,
/// e.g. `2024-05-01T00:00:00Z`. Sub-second precision appears only when
/// present.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, TypeError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| TypeError::InvalidTimestamp(raw.to_string()))
}

/// Half-open validity interval `[from, to)` of a fact.
///
/// A missing bound is unbounded on that side. Intervals are never mutated in
/// storage; closing one is expressed by an appended retraction and evaluated
/// with [`Validity::closed_at`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Validity {
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
}

impl Validity {
    /// Create an interval, rejecting empty or inverted bounds.
    pub fn new(from: Option<Timestamp>, to: Option<Timestamp>) -> Result<Self, TypeError> {
        if let (Some(from), Some(to)) = (from, to) {
            if to <= from {
                return Err(TypeError::InvalidInterval {
                    from: format_timestamp(&from),
                    to: format_timestamp(&to),
                });
            }
        }
        Ok(Self { from, to })
    }

    /// Interval valid from `from` with no end.
    pub fn starting(from: Timestamp) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Unbounded interval, used when ingestion supplies no validity.
    pub fn always() -> Self {
        Self::default()
    }

    /// Whether the interval contains `as_of`.
    pub fn contains(&self, as_of: &Timestamp) -> bool {
        self.from.map_or(true, |from| from <= *as_of) && self.to.map_or(true, |to| *as_of < to)
    }

    /// The effective interval after a retraction at `at`.
    ///
    /// The earlier of the explicit end and the retraction wins.
    pub fn closed_at(&self, at: Timestamp) -> Self {
        let to = match self.to {
            Some(existing) => existing.min(at),
            None => at,
        };
        Self {
            from: self.from,
            to: Some(to),
        }
    }

    pub fn is_open(&self) -> bool {
        self.to.is_none()
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from.as_ref().map(format_timestamp).unwrap_or_default();
        let to = self.to.as_ref().map(format_timestamp).unwrap_or_default();
        write!(f, "[{from}, {to})")
    }
}

/// Generation epoch of the fact store.
///
/// Bumped on every accepted write. A sealed view carries the epoch it was
/// sealed at, and every snapshot records the epoch it was materialized from,
/// so all workers of one generation run provably read the same graph state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl Epoch {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> Timestamp {
        parse_timestamp(raw).unwrap()
    }

    #[test]
    fn parse_rfc3339_and_date() {
        assert_eq!(
            format_timestamp(&ts("2024-05-01T10:30:00+02:00")),
            "2024-05-01T08:30:00Z"
        );
        assert_eq!(format_timestamp(&ts("1492-10-12")), "1492-10-12T00:00:00Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("last tuesday"),
            Err(TypeError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn format_keeps_subseconds_only_when_present() {
        assert_eq!(
            format_timestamp(&ts("2024-05-01T00:00:00.250Z")),
            "2024-05-01T00:00:00.250Z"
        );
    }

    #[test]
    fn contains_is_half_open() {
        let v = Validity::new(Some(ts("2020-01-01")), Some(ts("2021-01-01"))).unwrap();
        assert!(!v.contains(&ts("2019-12-31")));
        assert!(v.contains(&ts("2020-01-01")));
        assert!(v.contains(&ts("2020-06-15")));
        assert!(!v.contains(&ts("2021-01-01")));
    }

    #[test]
    fn open_interval_contains_future() {
        let v = Validity::starting(ts("2020-01-01"));
        assert!(v.contains(&ts("2999-01-01")));
        assert!(v.is_open());
    }

    #[test]
    fn new_rejects_inverted_bounds() {
        let err = Validity::new(Some(ts("2021-01-01")), Some(ts("2020-01-01")));
        assert!(matches!(err, Err(TypeError::InvalidInterval { .. })));
        assert!(Validity::new(Some(ts("2021-01-01")), Some(ts("2021-01-01"))).is_err());
        assert!(Validity::new(None, Some(ts("2021-01-01"))).is_ok());
    }

    #[test]
    fn closed_at_takes_earlier_end() {
        let v = Validity::new(Some(ts("2020-01-01")), Some(ts("2022-01-01"))).unwrap();
        assert_eq!(v.closed_at(ts("2021-01-01")).to, Some(ts("2021-01-01")));
        assert_eq!(v.closed_at(ts("2023-01-01")).to, Some(ts("2022-01-01")));
        let open = Validity::starting(ts("2020-01-01"));
        assert_eq!(open.closed_at(ts("2020-02-01")).to, Some(ts("2020-02-01")));
    }

    #[test]
    fn always_covers_historical_dates() {
        assert!(Validity::always().contains(&ts("0330-05-11")));
        assert!(Validity::always().contains(&ts("2024-01-01")));
    }

    #[test]
    fn epoch_advances() {
        assert!(Epoch::zero() < Epoch::zero().next());
        assert_eq!(format!("{}", Epoch(4)), "e4");
    }

    #[test]
    fn validity_display() {
        let v = Validity::starting(ts("2020-01-01"));
        assert_eq!(format!("{v}"), "[2020-01-01T00:00:00Z, )");
        assert_eq!(format!("{}", Validity::always()), "[, )");
    }

    mod props {
        use chrono::TimeZone;
        use proptest::prelude::*;

        use super::*;

        fn at(secs: i64) -> Timestamp {
            Utc.timestamp_opt(secs, 0).single().unwrap()
        }

        proptest! {
            #[test]
            fn closing_never_widens(from in 0i64..1_000_000, len in 1i64..1_000_000, close in 0i64..3_000_000, instant in 0i64..3_000_000) {
                let v = Validity::new(Some(at(from)), Some(at(from + len))).unwrap();
                let closed = v.closed_at(at(close));
                if closed.contains(&at(instant)) {
                    prop_assert!(v.contains(&at(instant)));
                }
            }
        }
    }
}
