//! Elapsed time values.
//!
//! Durations are persisted as whole seconds and displayed as `H:MM:SS`.
//! Timestamps feeding a duration are cut to whole seconds first, so a
//! reloaded entry reports the same span it was stored with.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};

/// Longest manual entry accepted: one leap year.
pub const MAX_MANUAL_MINUTES: i64 = 366 * 24 * 60;

/// `timestamp` without its sub-second part.
pub fn whole_seconds(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .duration_trunc(TimeDelta::seconds(1))
        .unwrap_or(timestamp)
}

/// A non-negative amount of tracked time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Elapsed(TimeDelta);

impl Elapsed {
    pub fn zero() -> Self {
        Self(TimeDelta::zero())
    }

    /// Wrap a delta, rejecting negative spans.
    pub fn new(delta: TimeDelta) -> Result<Self> {
        if delta < TimeDelta::zero() {
            return Err(Error::Validation(format!(
                "duration cannot be negative ({}s)",
                delta.num_seconds()
            )));
        }
        Ok(Self(delta))
    }

    pub fn from_minutes(minutes: i64) -> Result<Self> {
        if minutes < 0 {
            return Err(Error::Validation(format!(
                "duration minutes cannot be negative ({minutes})"
            )));
        }
        TimeDelta::try_minutes(minutes)
            .map(Self)
            .ok_or_else(|| Error::Validation(format!("duration of {minutes} minutes is too large")))
    }

    /// Minutes for a manual entry, bounded by [`MAX_MANUAL_MINUTES`].
    pub fn manual_minutes(minutes: i64) -> Result<Self> {
        if minutes > MAX_MANUAL_MINUTES {
            return Err(Error::Validation(format!(
                "duration of {minutes} minutes exceeds the {MAX_MANUAL_MINUTES} minute limit"
            )));
        }
        Self::from_minutes(minutes)
    }

    pub fn from_seconds(seconds: i64) -> Result<Self> {
        if seconds < 0 {
            return Err(Error::Validation(format!(
                "duration seconds cannot be negative ({seconds})"
            )));
        }
        TimeDelta::try_seconds(seconds)
            .map(Self)
            .ok_or_else(|| Error::Validation(format!("duration of {seconds} seconds is too large")))
    }

    pub fn as_delta(&self) -> TimeDelta {
        self.0
    }

    pub fn num_seconds(&self) -> i64 {
        self.0.num_seconds()
    }

    pub fn num_minutes(&self) -> i64 {
        self.0.num_minutes()
    }

    pub fn is_zero(&self) -> bool {
        self.0 == TimeDelta::zero()
    }
}

// Totals saturate at the largest representable span.
impl Add for Elapsed {
    type Output = Elapsed;

    fn add(self, rhs: Elapsed) -> Elapsed {
        Elapsed(self.0.checked_add(&rhs.0).unwrap_or(TimeDelta::MAX))
    }
}

impl AddAssign for Elapsed {
    fn add_assign(&mut self, rhs: Elapsed) {
        *self = *self + rhs;
    }
}

impl Sum for Elapsed {
    fn sum<I: Iterator<Item = Elapsed>>(iter: I) -> Elapsed {
        iter.fold(Elapsed::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Elapsed> for Elapsed {
    fn sum<I: Iterator<Item = &'a Elapsed>>(iter: I) -> Elapsed {
        iter.copied().sum()
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.num_seconds();
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        let seconds = total % 60;
        write!(f, "{hours}:{minutes:02}:{seconds:02}")
    }
}

impl Serialize for Elapsed {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0.num_seconds())
    }
}

impl<'de> Deserialize<'de> for Elapsed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let seconds = i64::deserialize(deserializer)?;
        Elapsed::from_seconds(seconds).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sums_across_values() {
        let total: Elapsed = [10, 20, 5]
            .into_iter()
            .map(|m| Elapsed::from_minutes(m).unwrap())
            .sum();
        assert_eq!(total, Elapsed::from_minutes(35).unwrap());
        assert_eq!(Vec::<Elapsed>::new().iter().sum::<Elapsed>(), Elapsed::zero());
    }

    #[test]
    fn negative_values_rejected() {
        assert!(matches!(Elapsed::from_minutes(-1), Err(Error::Validation(_))));
        assert!(matches!(
            Elapsed::new(TimeDelta::seconds(-5)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn sums_saturate_instead_of_overflowing() {
        let huge = Elapsed::new(TimeDelta::MAX).unwrap();
        let total: Elapsed = [huge, huge, Elapsed::from_minutes(1).unwrap()]
            .into_iter()
            .sum();
        assert_eq!(total.as_delta(), TimeDelta::MAX);

        let mut running = huge;
        running += huge;
        assert_eq!(running, huge);
    }

    #[test]
    fn manual_minutes_are_bounded() {
        assert_eq!(
            Elapsed::manual_minutes(MAX_MANUAL_MINUTES).unwrap().num_minutes(),
            MAX_MANUAL_MINUTES
        );
        assert!(matches!(
            Elapsed::manual_minutes(MAX_MANUAL_MINUTES + 1),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Elapsed::manual_minutes(153_722_867_280_912),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn whole_seconds_drops_fraction() {
        use chrono::{TimeZone, Timelike};
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
            + TimeDelta::milliseconds(700);
        let cut = whole_seconds(at);
        assert_eq!(cut.nanosecond(), 0);
        assert_eq!(cut.second(), 0);
    }

    #[test]
    fn displays_hours_minutes_seconds() {
        let value = Elapsed::from_seconds(3 * 3600 + 5 * 60 + 9).unwrap();
        assert_eq!(value.to_string(), "3:05:09");
        assert_eq!(Elapsed::zero().to_string(), "0:00:00");
    }

    #[test]
    fn serializes_as_seconds() {
        let value = Elapsed::from_minutes(15).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "900");
        let parsed: Elapsed = serde_json::from_str("900").unwrap();
        assert_eq!(parsed, value);
        assert!(serde_json::from_str::<Elapsed>("-1").is_err());
    }
}
