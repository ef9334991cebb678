//! Calendar versioning.
//!
//! CalVer versions are derived from the release date rather than from the
//! bump decision, so a CalVer package that has releasable commits always
//! moves to the version its format dictates for "today".

use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// Supported calendar version formats.
///
/// Month and day are rendered without leading zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CalverFormat {
    /// `YYYY.MM.DD`, with a numeric micro suffix for same-day re-releases
    /// (`2026.1.15`, then `2026.1.15.1`).
    YearMonthDay,
    /// `YYYY.MM.MICRO`, where micro counts releases within the month and
    /// resets to zero when the month changes.
    YearMonthMicro,
}

impl FromStr for CalverFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "YYYY.MM.DD" => Ok(Self::YearMonthDay),
            "YYYY.MM.MICRO" => Ok(Self::YearMonthMicro),
            other => Err(Error::CalverFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CalverFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::YearMonthDay => "YYYY.MM.DD",
            Self::YearMonthMicro => "YYYY.MM.MICRO",
        };
        write!(f, "{s}")
    }
}

/// Computes the next calendar version from the current version and date.
///
/// A current version that does not parse as dotted numbers (for example a
/// package migrating from SemVer) is treated as predating today, so the
/// result is the first version for today's date.
pub fn compute_calver(format: CalverFormat, current: &str, today: NaiveDate) -> Result<String> {
    let segments = parse_segments(current);
    let (year, month) = (u64::from(today.year_unsigned()), u64::from(today.month()));

    match format {
        CalverFormat::YearMonthDay => {
            let day = u64::from(today.day());
            match segments.as_deref() {
                // Same-day re-release: bump the micro suffix.
                Some([y, m, d]) if (*y, *m, *d) == (year, month, day) => {
                    Ok(format!("{year}.{month}.{day}.1"))
                }
                Some([y, m, d, micro]) if (*y, *m, *d) == (year, month, day) => {
                    Ok(format!("{year}.{month}.{day}.{}", micro + 1))
                }
                _ => Ok(format!("{year}.{month}.{day}")),
            }
        }
        CalverFormat::YearMonthMicro => match segments.as_deref() {
            Some([y, m, micro]) if (*y, *m) == (year, month) => {
                Ok(format!("{year}.{month}.{}", micro + 1))
            }
            _ => Ok(format!("{year}.{month}.0")),
        },
    }
}

fn parse_segments(version: &str) -> Option<Vec<u64>> {
    version
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// `chrono::Datelike::year` is signed; release dates are not.
trait YearUnsigned {
    fn year_unsigned(&self) -> u32;
}

impl YearUnsigned for NaiveDate {
    fn year_unsigned(&self) -> u32 {
        u32::try_from(self.year()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(
            "YYYY.MM.DD".parse::<CalverFormat>().unwrap(),
            CalverFormat::YearMonthDay
        );
        assert_eq!(
            "YYYY.MM.MICRO".parse::<CalverFormat>().unwrap(),
            CalverFormat::YearMonthMicro
        );
        assert!("YYYY.WW".parse::<CalverFormat>().is_err());
    }

    #[test]
    fn test_ymd_new_day() {
        let v = compute_calver(CalverFormat::YearMonthDay, "2026.1.14", date(2026, 1, 15)).unwrap();
        assert_eq!(v, "2026.1.15");
    }

    #[test]
    fn test_ymd_same_day_starts_micro() {
        let v = compute_calver(CalverFormat::YearMonthDay, "2026.1.15", date(2026, 1, 15)).unwrap();
        assert_eq!(v, "2026.1.15.1");
    }

    #[test]
    fn test_ymd_same_day_increments_micro() {
        let v =
            compute_calver(CalverFormat::YearMonthDay, "2026.1.15.1", date(2026, 1, 15)).unwrap();
        assert_eq!(v, "2026.1.15.2");
    }

    #[test]
    fn test_ymd_new_day_drops_micro() {
        let v =
            compute_calver(CalverFormat::YearMonthDay, "2026.1.15.3", date(2026, 1, 16)).unwrap();
        assert_eq!(v, "2026.1.16");
    }

    #[test]
    fn test_ymd_no_leading_zeros() {
        let v = compute_calver(CalverFormat::YearMonthDay, "2025.12.31", date(2026, 2, 3)).unwrap();
        assert_eq!(v, "2026.2.3");
    }

    #[test]
    fn test_micro_same_month_increments() {
        let v =
            compute_calver(CalverFormat::YearMonthMicro, "2026.1.3", date(2026, 1, 20)).unwrap();
        assert_eq!(v, "2026.1.4");
    }

    #[test]
    fn test_micro_new_month_resets() {
        let v = compute_calver(CalverFormat::YearMonthMicro, "2026.1.7", date(2026, 2, 1)).unwrap();
        assert_eq!(v, "2026.2.0");
    }

    #[test]
    fn test_semver_current_starts_fresh() {
        let v = compute_calver(CalverFormat::YearMonthMicro, "1.4.2-rc.1", date(2026, 3, 5))
            .unwrap();
        assert_eq!(v, "2026.3.0");
    }
}
