use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d %b %Y", "%d %B %Y"];

/// Numeric dates with the year last, e.g. `06/30/2021`.
const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y", "%m-%d-%Y"];
const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Formats with no day component, resolved to the first of the month.
const MONTH_FORMATS: &[&str] = &["%Y-%m-%d", "%d %b %Y", "%d %B %Y", "%d-%b-%Y", "%d-%B-%Y", "%d/%m/%Y"];

/// Parse a reporting-period cell into a date.
///
/// Returns `None` for anything that is not recognisably a date; callers drop
/// such rows rather than inventing a period for them. Numeric dates such as
/// `01/02/2020` are read month first; a value that cannot be month first
/// (`30/06/2021`) is read day first.
///
/// ```
/// use balance_sheet_analytics::core::period::parse_period;
/// use chrono::NaiveDate;
///
/// assert_eq!(parse_period("2020-01-31"), NaiveDate::from_ymd_opt(2020, 1, 31));
/// assert_eq!(parse_period("06/30/2021"), NaiveDate::from_ymd_opt(2021, 6, 30));
/// assert_eq!(parse_period("Feb 2020"), NaiveDate::from_ymd_opt(2020, 2, 1));
/// assert_eq!(parse_period("not a date"), None);
/// ```
pub fn parse_period(raw: &str) -> Option<NaiveDate> {
    parse_period_with(raw, false)
}

/// [`parse_period`] with the preferred order of numeric dates chosen by
/// `day_first`. The other order is still tried when the preferred one
/// cannot produce a valid date.
pub fn parse_period_with(raw: &str, day_first: bool) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let (preferred, fallback) = if day_first {
        (DAY_FIRST_FORMATS, MONTH_FIRST_FORMATS)
    } else {
        (MONTH_FIRST_FORMATS, DAY_FIRST_FORMATS)
    };
    let date_formats = DATE_FORMATS.iter().chain(preferred).chain(fallback);

    for fmt in date_formats {
        if let Some(d) = NaiveDate::parse_from_str(s, fmt).ok().and_then(plausible) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Some(d) = NaiveDateTime::parse_from_str(s, fmt)
            .ok()
            .and_then(|dt| plausible(dt.date()))
        {
            return Some(d);
        }
    }

    // "2020-01", "Jan 2020", "January 2020", "Jan-2020", "01/2020"
    let candidates = [
        format!("{}-01", s),
        format!("01-{}", s),
        format!("01/{}", s),
        format!("01 {}", s),
    ];
    for candidate in &candidates {
        for fmt in MONTH_FORMATS {
            if let Some(d) = NaiveDate::parse_from_str(candidate, fmt)
                .ok()
                .and_then(plausible)
            {
                return Some(d);
            }
        }
    }
    None
}

// chrono accepts signed years, so "01 Jun-2021" would otherwise parse as 2021 BC.
fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (1800..=2200).contains(&date.year()).then_some(date)
}

/// `YYYY-MM` label of a period, as used by month pickers.
pub fn month_label(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Reporting frequency inferred from the spacing of periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Monthly,
    Quarterly,
    Annual,
    Irregular,
    /// Fewer than two distinct periods.
    Unknown,
}

impl Frequency {
    /// Classify by the median gap in days between consecutive distinct periods.
    pub fn infer(periods: &[NaiveDate]) -> Self {
        let mut sorted = periods.to_vec();
        sorted.sort();
        sorted.dedup();
        if sorted.len() < 2 {
            return Frequency::Unknown;
        }

        let mut gaps: Vec<i64> = sorted
            .windows(2)
            .map(|w| (w[1] - w[0]).num_days())
            .collect();
        gaps.sort_unstable();
        let median = gaps[gaps.len() / 2];

        match median {
            28..=31 => Frequency::Monthly,
            89..=92 => Frequency::Quarterly,
            365..=366 => Frequency::Annual,
            _ => Frequency::Irregular,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Frequency::Monthly => "Monthly",
            Frequency::Quarterly => "Quarterly",
            Frequency::Annual => "Annual",
            Frequency::Irregular => "Irregular",
            Frequency::Unknown => "Unknown",
        };
        f.write_str(text)
    }
}
