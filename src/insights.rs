//! Aggregation of a segmented table into an insights snapshot

use std::collections::{BTreeMap, HashMap};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::data::Table;
use crate::features::{extract, Features};
use crate::fields::{classify, FieldRoles};
use crate::rfm::RfmScore;
use crate::segment::{segment, ClusterQuality, SegmentAssignment, Strategy};
use crate::trend::{monthly_trend, TrendPoint, TrendSource};

/// Range of placeholder scatter coordinates
const PLACEHOLDER_SCATTER_MAX: f64 = 100.0;

/// Outcome of analyzing one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Analysis {
    /// The table had no records
    NoData,
    #[serde(rename = "ok")]
    Insights(InsightsSnapshot),
}

impl Analysis {
    pub fn snapshot(&self) -> Option<&InsightsSnapshot> {
        match self {
            Analysis::Insights(snapshot) => Some(snapshot),
            Analysis::NoData => None,
        }
    }
}

/// Record count and share of one named segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentShare {
    pub name: String,
    pub count: usize,
    /// Percent of all records, one decimal
    pub percentage: f64,
}

/// One point of the cluster scatter chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub cluster: usize,
    pub segment: String,
}

/// A record enriched with its derived values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    /// 1-based position in the table
    pub id: usize,
    pub identifier: String,
    pub amount: f64,
    pub segment: String,
    pub cluster_id: usize,
    /// Raw numeric features (k-means mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<BTreeMap<String, f64>>,
    /// RFM scores (RFM mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rfm: Option<RfmScore>,
    pub record: BTreeMap<String, String>,
}

/// Everything the presentation layer renders for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightsSnapshot {
    pub total_customers: usize,
    pub total_revenue: f64,
    pub avg_value: f64,
    /// Sorted by count (descending), then name
    pub segments: Vec<SegmentShare>,
    pub top_segment: Option<String>,
    pub monthly_data: Vec<TrendPoint>,
    pub trend_source: TrendSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_data: Option<Vec<ScatterPoint>>,
    pub fields: FieldRoles,
    pub strategy: Strategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_quality: Option<ClusterQuality>,
    pub customers: Vec<CustomerRecord>,
}

/// Run the whole pipeline on one table
///
/// Never fails: an empty table gives [`Analysis::NoData`] and every
/// malformed cell degrades to a fallback value.
pub fn analyze(table: &Table, config: &AnalysisConfig) -> Analysis {
    if table.is_empty() {
        log::info!("Table has no records, nothing to analyze");
        return Analysis::NoData;
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let roles = classify(table);
    let features = extract(table, &roles);
    log::info!(
        "Segmenting {} records over {} numeric fields ({:?})",
        table.len(),
        features.fields.len(),
        config.strategy
    );
    let assignment = segment(table, &roles, &features, config, &mut rng);

    Analysis::Insights(aggregate(
        table,
        &roles,
        &features,
        &assignment,
        config,
        &mut rng,
    ))
}

/// Combine classification, features and segments into a snapshot
pub fn aggregate<R: Rng + ?Sized>(
    table: &Table,
    roles: &FieldRoles,
    features: &Features,
    assignment: &SegmentAssignment,
    config: &AnalysisConfig,
    rng: &mut R,
) -> InsightsSnapshot {
    let total_customers = table.len();
    let total_revenue: f64 = features.amounts.iter().sum();
    let avg_value = if total_customers > 0 {
        total_revenue / total_customers as f64
    } else {
        0.0
    };

    let segments = segment_distribution(&assignment.names);
    let top_segment = segments.first().map(|s| s.name.clone());

    let date_column = roles.primary_date().and_then(|name| table.column_index(name));
    let (monthly_data, trend_source) = monthly_trend(
        table,
        date_column,
        &features.amounts,
        config.reference_date,
        rng,
    );

    let cluster_data = match assignment.strategy {
        Strategy::KMeans => Some(scatter_points(features, assignment, rng)),
        Strategy::Rfm => None,
    };

    InsightsSnapshot {
        total_customers,
        total_revenue,
        avg_value,
        segments,
        top_segment,
        monthly_data,
        trend_source,
        cluster_data,
        fields: roles.clone(),
        strategy: assignment.strategy,
        cluster_quality: assignment.quality.clone(),
        customers: customer_records(table, roles, features, assignment),
    }
}

/// Count records per segment name
///
/// Ordered by count descending with ties broken by name, so the first
/// entry is the top segment.
pub fn segment_distribution(names: &[String]) -> Vec<SegmentShare> {
    let total = names.len();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name.as_str()).or_insert(0) += 1;
    }

    let mut shares: Vec<SegmentShare> = counts
        .into_iter()
        .map(|(name, count)| SegmentShare {
            name: name.to_string(),
            count,
            percentage: percentage(count, total),
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 * 1000.0 / total as f64).round() / 10.0
}

/// Project records on the first two numeric fields
///
/// With fewer than two numeric fields the coordinates are placeholders.
fn scatter_points<R: Rng + ?Sized>(
    features: &Features,
    assignment: &SegmentAssignment,
    rng: &mut R,
) -> Vec<ScatterPoint> {
    let projectable = features.values.ncols() >= 2;
    if !projectable {
        log::warn!("Fewer than two numeric fields, scatter uses placeholder coordinates");
    }

    assignment
        .segment_ids
        .iter()
        .zip(&assignment.names)
        .enumerate()
        .map(|(row, (&cluster, name))| {
            let (x, y) = if projectable {
                (features.values[[row, 0]], features.values[[row, 1]])
            } else {
                (
                    rng.gen_range(0.0..PLACEHOLDER_SCATTER_MAX),
                    rng.gen_range(0.0..PLACEHOLDER_SCATTER_MAX),
                )
            };
            ScatterPoint {
                x,
                y,
                cluster,
                segment: name.clone(),
            }
        })
        .collect()
}

fn customer_records(
    table: &Table,
    roles: &FieldRoles,
    features: &Features,
    assignment: &SegmentAssignment,
) -> Vec<CustomerRecord> {
    let identifier_column = roles
        .identifier_field
        .as_deref()
        .and_then(|name| table.column_index(name));

    table
        .records()
        .enumerate()
        .map(|(row, record)| {
            let feature_map = assignment.model.as_ref().map(|_| {
                features
                    .fields
                    .iter()
                    .enumerate()
                    .map(|(col, field)| (field.clone(), features.values[[row, col]]))
                    .collect()
            });

            CustomerRecord {
                id: row + 1,
                identifier: identifier_column
                    .map(|col| table.value(row, col).to_string())
                    .unwrap_or_default(),
                amount: features.amounts[row],
                segment: assignment.names[row].clone(),
                cluster_id: assignment.segment_ids[row],
                features: feature_map,
                rfm: assignment.rfm_scores.as_ref().map(|scores| scores[row]),
                record: record.to_map(),
            }
        })
        .collect()
}
