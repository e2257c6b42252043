//! Rule-based RFM (Recency, Frequency, Monetary) scoring

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::Table;
use crate::fields::parse_number;

/// Upper bound (exclusive) for placeholder recency draws, in days
const PLACEHOLDER_RECENCY_DAYS: u32 = 365;
/// Placeholder frequency draws are in 1..=20
const PLACEHOLDER_MAX_FREQUENCY: u32 = 20;

/// RFM customer category, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RfmSegment {
    Champions,
    LoyalCustomers,
    PotentialLoyalists,
    AtRisk,
    NeedAttention,
    LostCustomers,
}

impl RfmSegment {
    pub const ALL: [RfmSegment; 6] = [
        RfmSegment::Champions,
        RfmSegment::LoyalCustomers,
        RfmSegment::PotentialLoyalists,
        RfmSegment::AtRisk,
        RfmSegment::NeedAttention,
        RfmSegment::LostCustomers,
    ];

    /// Display name used in insights
    pub fn name(self) -> &'static str {
        match self {
            RfmSegment::Champions => "Champions",
            RfmSegment::LoyalCustomers => "Loyal Customers",
            RfmSegment::PotentialLoyalists => "Potential Loyalists",
            RfmSegment::AtRisk => "At Risk",
            RfmSegment::NeedAttention => "Need Attention",
            RfmSegment::LostCustomers => "Lost Customers",
        }
    }

    /// Stable numeric id (position in [`RfmSegment::ALL`])
    pub fn id(self) -> usize {
        self as usize
    }

    /// Map an average 1-5 score to a category
    pub fn from_average(average: f64) -> Self {
        if average >= 4.5 {
            RfmSegment::Champions
        } else if average >= 4.0 {
            RfmSegment::LoyalCustomers
        } else if average >= 3.5 {
            RfmSegment::PotentialLoyalists
        } else if average >= 3.0 {
            RfmSegment::AtRisk
        } else if average >= 2.0 {
            RfmSegment::NeedAttention
        } else {
            RfmSegment::LostCustomers
        }
    }
}

/// Raw RFM values of one customer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RfmValues {
    /// Days since last activity
    pub recency: f64,
    /// Number of purchases
    pub frequency: f64,
    /// Spend
    pub monetary: f64,
}

/// Ordinal 1-5 scores of one customer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfmScore {
    pub recency: u8,
    pub frequency: u8,
    pub monetary: u8,
}

impl RfmScore {
    pub fn from_values(values: &RfmValues) -> Self {
        RfmScore {
            recency: recency_score(values.recency),
            frequency: frequency_score(values.frequency),
            monetary: monetary_score(values.monetary),
        }
    }

    pub fn average(&self) -> f64 {
        f64::from(self.recency + self.frequency + self.monetary) / 3.0
    }

    pub fn segment(&self) -> RfmSegment {
        RfmSegment::from_average(self.average())
    }
}

/// Lower recency (more recent) scores higher
pub fn recency_score(days: f64) -> u8 {
    if days < 30.0 {
        5
    } else if days < 90.0 {
        4
    } else if days < 180.0 {
        3
    } else if days < 365.0 {
        2
    } else {
        1
    }
}

pub fn frequency_score(count: f64) -> u8 {
    if count > 15.0 {
        5
    } else if count > 10.0 {
        4
    } else if count > 5.0 {
        3
    } else if count > 2.0 {
        2
    } else {
        1
    }
}

pub fn monetary_score(amount: f64) -> u8 {
    if amount > 1000.0 {
        5
    } else if amount > 500.0 {
        4
    } else if amount > 200.0 {
        3
    } else if amount > 50.0 {
        2
    } else {
        1
    }
}

/// Collect RFM values for every record
///
/// Monetary is the primary amount. Recency and frequency come from the
/// named columns when they exist in the table (unparseable cells read as
/// 0.0); otherwise they are drawn from `rng` as placeholders.
pub fn collect_values<R: Rng + ?Sized>(
    table: &Table,
    amounts: &[f64],
    recency_field: Option<&str>,
    frequency_field: Option<&str>,
    rng: &mut R,
) -> Vec<RfmValues> {
    let recency_column = resolve_column(table, recency_field);
    let frequency_column = resolve_column(table, frequency_field);
    let placeholders = placeholder_inputs(recency_column, frequency_column);
    if !placeholders.is_empty() {
        log::warn!(
            "No {} column, using placeholder values for it",
            placeholders.join(" or ")
        );
    }

    amounts
        .iter()
        .enumerate()
        .map(|(row, &monetary)| {
            let recency = match recency_column {
                Some(col) => parse_number(table.value(row, col)).unwrap_or(0.0),
                None => f64::from(rng.gen_range(0..PLACEHOLDER_RECENCY_DAYS)),
            };
            let frequency = match frequency_column {
                Some(col) => parse_number(table.value(row, col)).unwrap_or(0.0),
                None => f64::from(rng.gen_range(1..=PLACEHOLDER_MAX_FREQUENCY)),
            };
            RfmValues {
                recency,
                frequency,
                monetary,
            }
        })
        .collect()
}

/// RFM inputs without a column, drawn at random instead
fn placeholder_inputs(recency: Option<usize>, frequency: Option<usize>) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if recency.is_none() {
        missing.push("recency");
    }
    if frequency.is_none() {
        missing.push("frequency");
    }
    missing
}

fn resolve_column(table: &Table, field: Option<&str>) -> Option<usize> {
    let name = field?;
    let column = table.column_index(name);
    if column.is_none() {
        log::warn!("RFM column '{}' not found in table", name);
    }
    column
}
