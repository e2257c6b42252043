//! Monthly trend buckets from date fields, with a synthetic fallback

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::Table;

/// Number of months kept in a trend
pub const TREND_MONTHS: usize = 12;
/// Bounds of the multiplicative jitter applied to synthetic revenue
const JITTER_RANGE: std::ops::RangeInclusive<f64> = 0.8..=1.2;

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// One month of activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// `YYYY-MM`
    pub month: String,
    pub customers: usize,
    pub revenue: f64,
}

/// Where the trend figures came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrendSource {
    Dates,
    Synthetic,
}

/// Parse a date cell in one of the common layouts
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Some(datetime.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|datetime| datetime.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

/// Build the monthly trend for a table
///
/// Records are bucketed by calendar month of `date_column`; the last
/// [`TREND_MONTHS`] buckets are kept in chronological order. Unparseable
/// dates are skipped. Without a date column, or when no date parses, a
/// synthetic trend ending at `reference_date` is returned instead.
pub fn monthly_trend<R: Rng + ?Sized>(
    table: &Table,
    date_column: Option<usize>,
    amounts: &[f64],
    reference_date: NaiveDate,
    rng: &mut R,
) -> (Vec<TrendPoint>, TrendSource) {
    if let Some(col) = date_column {
        let trend = dated_trend(table, col, amounts);
        if !trend.is_empty() {
            return (trend, TrendSource::Dates);
        }
        log::warn!("No parseable dates in the date field, falling back to a synthetic trend");
    }

    let total_revenue: f64 = amounts.iter().sum();
    (
        synthetic_trend(amounts.len(), total_revenue, reference_date, rng),
        TrendSource::Synthetic,
    )
}

fn dated_trend(table: &Table, col: usize, amounts: &[f64]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<(i32, u32), (usize, f64)> = BTreeMap::new();
    for (row, &amount) in amounts.iter().enumerate() {
        if let Some(date) = parse_date(table.value(row, col)) {
            let bucket = buckets.entry((date.year(), date.month())).or_insert((0, 0.0));
            bucket.0 += 1;
            bucket.1 += amount;
        }
    }

    let skip = buckets.len().saturating_sub(TREND_MONTHS);
    buckets
        .into_iter()
        .skip(skip)
        .map(|((year, month), (customers, revenue))| TrendPoint {
            month: month_label(year, month),
            customers,
            revenue,
        })
        .collect()
}

/// Twelve evenly filled months ending at the reference month
///
/// Counts differ by at most one and sum to `n_records`; revenue is an even
/// share of the total scaled by a random factor in 0.8..=1.2.
pub fn synthetic_trend<R: Rng + ?Sized>(
    n_records: usize,
    total_revenue: f64,
    reference_date: NaiveDate,
    rng: &mut R,
) -> Vec<TrendPoint> {
    let base = n_records / TREND_MONTHS;
    let remainder = n_records % TREND_MONTHS;
    let monthly_revenue = total_revenue / TREND_MONTHS as f64;
    let last = month_index(reference_date.year(), reference_date.month());
    let first = last - (TREND_MONTHS as i64 - 1);

    (0..TREND_MONTHS)
        .map(|i| {
            let (year, month) = from_month_index(first + i as i64);
            TrendPoint {
                month: month_label(year, month),
                customers: base + usize::from(i < remainder),
                revenue: monthly_revenue * rng.gen_range(JITTER_RANGE),
            }
        })
        .collect()
}

fn month_index(year: i32, month: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month) - 1
}

fn from_month_index(index: i64) -> (i32, u32) {
    (index.div_euclid(12) as i32, index.rem_euclid(12) as u32 + 1)
}

fn month_label(year: i32, month: u32) -> String {
    format!("{year:04}-{month:02}")
}
