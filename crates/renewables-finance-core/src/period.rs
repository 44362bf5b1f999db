//! Period arithmetic shared by every other module.
//!
//! A period is an annual, quarterly or monthly slice of time. Canonical
//! labels are `"2025"`, `"2025-Q3"` and `"03/01/2025"`; `"2025-03"` is also
//! accepted for months.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FinanceError;
use crate::FinanceResult;

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Granularity of a forecast timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    #[default]
    Annual,
    Quarterly,
    Monthly,
}

impl PeriodKind {
    pub fn periods_per_year(self) -> u32 {
        match self {
            PeriodKind::Annual => 1,
            PeriodKind::Quarterly => 4,
            PeriodKind::Monthly => 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Period {
    Annual { year: i32 },
    Quarterly { year: i32, quarter: u32 },
    Monthly { year: i32, month: u32 },
}

impl Period {
    pub fn annual(year: i32) -> FinanceResult<Self> {
        check_year(year, &year.to_string())?;
        Ok(Period::Annual { year })
    }

    pub fn quarterly(year: i32, quarter: u32) -> FinanceResult<Self> {
        let label = format!("{year}-Q{quarter}");
        check_year(year, &label)?;
        if !(1..=4).contains(&quarter) {
            return Err(format_error(&label, "quarter must be between 1 and 4"));
        }
        Ok(Period::Quarterly { year, quarter })
    }

    pub fn monthly(year: i32, month: u32) -> FinanceResult<Self> {
        let label = format!("{year}-{month:02}");
        check_year(year, &label)?;
        if !(1..=12).contains(&month) {
            return Err(format_error(&label, "month must be between 1 and 12"));
        }
        Ok(Period::Monthly { year, month })
    }

    pub fn kind(&self) -> PeriodKind {
        match self {
            Period::Annual { .. } => PeriodKind::Annual,
            Period::Quarterly { .. } => PeriodKind::Quarterly,
            Period::Monthly { .. } => PeriodKind::Monthly,
        }
    }

    pub fn year(&self) -> i32 {
        match *self {
            Period::Annual { year } | Period::Quarterly { year, .. } | Period::Monthly { year, .. } => {
                year
            }
        }
    }

    /// Calendar quarter the period falls in. `None` for annual periods.
    pub fn quarter(&self) -> Option<u32> {
        match *self {
            Period::Annual { .. } => None,
            Period::Quarterly { quarter, .. } => Some(quarter),
            Period::Monthly { month, .. } => Some(month.saturating_sub(1) / 3 + 1),
        }
    }

    pub fn month(&self) -> Option<u32> {
        match *self {
            Period::Monthly { month, .. } => Some(month),
            _ => None,
        }
    }

    /// Share of a year covered: 1, 0.25 or 1/12.
    pub fn fraction_of_year(&self) -> Decimal {
        match self {
            Period::Annual { .. } => Decimal::ONE,
            Period::Quarterly { .. } => dec!(0.25),
            Period::Monthly { .. } => Decimal::ONE / dec!(12),
        }
    }

    /// Hours in the period on an 8,760-hour year.
    pub fn hours(&self) -> Decimal {
        match self {
            Period::Annual { .. } => dec!(8760),
            Period::Quarterly { .. } => dec!(2190),
            Period::Monthly { .. } => dec!(730),
        }
    }

    /// Days in the period on a 365-day year.
    pub fn days(&self) -> Decimal {
        match self {
            Period::Annual { .. } => dec!(365),
            Period::Quarterly { .. } => dec!(91.25),
            Period::Monthly { .. } => dec!(365) / dec!(12),
        }
    }

    /// `(year, quarter, month)` of the first instant of the period.
    pub fn start_triple(&self) -> (i32, u32, u32) {
        match *self {
            Period::Annual { year } => (year, 1, 1),
            Period::Quarterly { year, quarter } => {
                (year, quarter, quarter.saturating_mul(3).saturating_sub(2))
            }
            Period::Monthly { year, month } => (year, month.saturating_sub(1) / 3 + 1, month),
        }
    }

    /// First day of the period.
    pub fn start_date(&self) -> NaiveDate {
        let (year, _, month) = self.start_triple();
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
    }

    /// First day after the period (exclusive end).
    pub fn end_date(&self) -> NaiveDate {
        self.next().start_date()
    }

    /// Last day inside the period.
    pub fn last_day(&self) -> NaiveDate {
        self.end_date().pred_opt().unwrap_or_default()
    }

    /// The period immediately following this one, same granularity.
    pub fn next(&self) -> Period {
        match *self {
            Period::Annual { year } => Period::Annual { year: year + 1 },
            Period::Quarterly { year, quarter: 4 } => Period::Quarterly {
                year: year + 1,
                quarter: 1,
            },
            Period::Quarterly { year, quarter } => Period::Quarterly {
                year,
                quarter: quarter + 1,
            },
            Period::Monthly { year, month: 12 } => Period::Monthly {
                year: year + 1,
                month: 1,
            },
            Period::Monthly { year, month } => Period::Monthly {
                year,
                month: month + 1,
            },
        }
    }

    /// Whole years of degradation applied in this period for an asset
    /// commissioned in `commission_year`. Never negative.
    pub fn degradation_offset(&self, commission_year: i32) -> u32 {
        (self.year() - commission_year).max(0) as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date < self.end_date()
    }

    /// The calendar months making up the period, in order.
    pub fn months(&self) -> Vec<Period> {
        let (year, _, first) = self.start_triple();
        let count = 12 / self.kind().periods_per_year();
        (first..first + count)
            .map(|month| Period::Monthly { year, month })
            .collect()
    }

    /// Share of the period's calendar days inside `[from, to)`, 0 to 1.
    pub fn share_within(&self, from: NaiveDate, to: NaiveDate) -> Decimal {
        let days = (self.end_date() - self.start_date()).num_days();
        if days <= 0 {
            return Decimal::ZERO;
        }
        let inside = self.overlap_days(from, to);
        if inside >= days {
            Decimal::ONE
        } else {
            Decimal::from(inside) / Decimal::from(days)
        }
    }

    /// Days of the period inside `[from, to)`.
    pub fn overlap_days(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        let start = self.start_date().max(from);
        let end = self.end_date().min(to);
        (end - start).num_days().max(0)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Period::Annual { year } => write!(f, "{year:04}"),
            Period::Quarterly { year, quarter } => write!(f, "{year:04}-Q{quarter}"),
            Period::Monthly { year, month } => write!(f, "{month:02}/01/{year:04}"),
        }
    }
}

impl FromStr for Period {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_period(s)
    }
}

impl TryFrom<String> for Period {
    type Error = FinanceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        parse_period(&value)
    }
}

impl From<Period> for String {
    fn from(p: Period) -> Self {
        p.to_string()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a period label.
///
/// Accepts `"YYYY"`, `"YYYY-Qn"`, `"mm/dd/YYYY"` and `"YYYY-MM"`. Anything
/// else is a [`FinanceError::Format`].
pub fn parse_period(raw: &str) -> FinanceResult<Period> {
    let s = raw.trim();

    if let Some((year, quarter)) = s.split_once("-Q") {
        let year = parse_year(year, raw)?;
        let quarter = parse_digits(quarter, 1, raw, "quarter")?;
        return Period::quarterly(year, quarter);
    }

    if s.contains('/') {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.len() != 3 {
            return Err(format_error(raw, "expected mm/dd/YYYY"));
        }
        let month = parse_digits(parts[0], 2, raw, "month")?;
        let day = parse_digits(parts[1], 2, raw, "day")?;
        let year = parse_year(parts[2], raw)?;
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| format_error(raw, "not a calendar date"))?;
        return Period::monthly(date.year(), date.month());
    }

    if let Some((year, month)) = s.split_once('-') {
        let year = parse_year(year, raw)?;
        let month = parse_digits(month, 2, raw, "month")?;
        return Period::monthly(year, month);
    }

    let year = parse_year(s, raw)?;
    Period::annual(year)
}

fn parse_year(s: &str, raw: &str) -> FinanceResult<i32> {
    if s.len() != 4 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format_error(raw, "year must be four digits"));
    }
    s.parse::<i32>()
        .map_err(|_| format_error(raw, "year must be four digits"))
}

fn parse_digits(s: &str, width: usize, raw: &str, what: &str) -> FinanceResult<u32> {
    if s.len() != width || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format_error(raw, &format!("{what} must be {width} digit(s)")));
    }
    s.parse::<u32>()
        .map_err(|_| format_error(raw, &format!("{what} is not a number")))
}

fn check_year(year: i32, label: &str) -> FinanceResult<()> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(format_error(label, "year out of range"));
    }
    Ok(())
}

fn format_error(input: &str, reason: &str) -> FinanceError {
    FinanceError::Format {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Timelines
// ---------------------------------------------------------------------------

/// `count` consecutive periods of `kind`, starting with the first period of
/// `start_year`.
pub fn generate_periods(kind: PeriodKind, start_year: i32, count: u32) -> Vec<Period> {
    let first = match kind {
        PeriodKind::Annual => Period::Annual { year: start_year },
        PeriodKind::Quarterly => Period::Quarterly {
            year: start_year,
            quarter: 1,
        },
        PeriodKind::Monthly => Period::Monthly {
            year: start_year,
            month: 1,
        },
    };
    std::iter::successors(Some(first), |p| Some(p.next()))
        .take(count as usize)
        .collect()
}

/// Every period of `kind` covering `years` whole years from `start_year`.
pub fn periods_for_years(kind: PeriodKind, start_year: i32, years: u32) -> Vec<Period> {
    generate_periods(kind, start_year, years * kind.periods_per_year())
}

/// Fiscal year a calendar month falls in, labelled by the calendar year the
/// fiscal year ends in. With `start_month` 7, July 2025 is in fiscal 2026.
pub fn fiscal_year(year: i32, month: u32, start_month: u32) -> i32 {
    if start_month > 1 && month >= start_month {
        year + 1
    } else {
        year
    }
}

/// First day of fiscal year `fiscal_year`.
pub fn fiscal_year_start(fiscal_year: i32, start_month: u32) -> NaiveDate {
    let year = if start_month > 1 { fiscal_year - 1 } else { fiscal_year };
    NaiveDate::from_ymd_opt(year, start_month.clamp(1, 12), 1).unwrap_or_default()
}

/// Fractional calendar year of a date, e.g. 1 July 2025 is about 2025.496.
pub fn fractional_year(date: NaiveDate) -> Decimal {
    let year_start = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date);
    let days_in_year = if date.leap_year() { dec!(366) } else { dec!(365) };
    let elapsed = Decimal::from((date - year_start).num_days());
    Decimal::from(date.year()) + elapsed / days_in_year
}
