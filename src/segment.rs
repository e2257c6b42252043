//! Segmentation strategies and cluster naming

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::data::Table;
use crate::features::{normalize, Features};
use crate::fields::FieldRoles;
use crate::model::{fit_kmeans, KMeansModel};
use crate::rfm::{self, RfmScore};

/// How records are assigned to segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Fixed-threshold RFM scoring
    Rfm,
    /// K-Means over the z-scored numeric fields
    #[default]
    #[serde(rename = "kmeans")]
    #[value(name = "kmeans")]
    KMeans,
}

/// Quality figures of a k-means run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterQuality {
    pub k: usize,
    /// Records per cluster id
    pub sizes: Vec<usize>,
    pub inertia: f64,
    pub silhouette: f64,
}

/// Segment of every record, aligned with the table rows
#[derive(Debug, Clone)]
pub struct SegmentAssignment {
    pub strategy: Strategy,
    /// Cluster id (k-means) or RFM category id per record
    pub segment_ids: Vec<usize>,
    /// Display name per record
    pub names: Vec<String>,
    /// Present in k-means mode
    pub model: Option<KMeansModel>,
    pub quality: Option<ClusterQuality>,
    /// Present in RFM mode
    pub rfm_scores: Option<Vec<RfmScore>>,
}

impl SegmentAssignment {
    pub fn len(&self) -> usize {
        self.segment_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segment_ids.is_empty()
    }
}

/// Assign every record of `table` to exactly one segment
pub fn segment<R: Rng + ?Sized>(
    table: &Table,
    roles: &FieldRoles,
    features: &Features,
    config: &AnalysisConfig,
    rng: &mut R,
) -> SegmentAssignment {
    match config.strategy {
        Strategy::Rfm => segment_rfm(table, features, config, rng),
        Strategy::KMeans => segment_kmeans(roles, features, config, rng),
    }
}

fn segment_rfm<R: Rng + ?Sized>(
    table: &Table,
    features: &Features,
    config: &AnalysisConfig,
    rng: &mut R,
) -> SegmentAssignment {
    let values = rfm::collect_values(
        table,
        &features.amounts,
        config.recency_field.as_deref(),
        config.frequency_field.as_deref(),
        rng,
    );
    let scores: Vec<RfmScore> = values.iter().map(RfmScore::from_values).collect();
    let segments: Vec<_> = scores.iter().map(RfmScore::segment).collect();

    SegmentAssignment {
        strategy: Strategy::Rfm,
        segment_ids: segments.iter().map(|s| s.id()).collect(),
        names: segments.iter().map(|s| s.name().to_string()).collect(),
        model: None,
        quality: None,
        rfm_scores: Some(scores),
    }
}

fn segment_kmeans<R: Rng + ?Sized>(
    roles: &FieldRoles,
    features: &Features,
    config: &AnalysisConfig,
    rng: &mut R,
) -> SegmentAssignment {
    if features.fields.is_empty() {
        log::warn!("No numeric fields detected, all records fall into one cluster");
    }

    let normalized = normalize(&features.values);
    let model = fit_kmeans(&normalized, config.max_clusters, config.max_iterations, rng);
    let labels = model.labels.to_vec();

    let cluster_names = name_clusters(
        &labels,
        model.n_clusters,
        &features.values,
        roles.primary_amount_feature(),
    );
    let names = labels.iter().map(|&l| cluster_names[l].clone()).collect();

    let quality = ClusterQuality {
        k: model.n_clusters,
        sizes: model.cluster_sizes(),
        inertia: model.inertia,
        silhouette: model.compute_silhouette_sample(normalized.view(), config.silhouette_sample),
    };

    SegmentAssignment {
        strategy: Strategy::KMeans,
        segment_ids: labels,
        names,
        model: Some(model),
        quality: Some(quality),
        rfm_scores: None,
    }
}

/// Name each cluster from its statistics
///
/// With a value feature (column of `raw`), a cluster is named by how its
/// mean compares to the global mean and by its share of records. Without
/// one, only the share is used. Returns one name per cluster id; equal
/// names are allowed and merge downstream.
pub fn name_clusters(
    labels: &[usize],
    n_clusters: usize,
    raw: &Array2<f64>,
    value_feature: Option<usize>,
) -> Vec<String> {
    let total = labels.len();
    let mut sizes = vec![0usize; n_clusters];
    let mut sums = vec![0.0f64; n_clusters];
    let value_column = value_feature.filter(|&col| col < raw.ncols() && raw.nrows() == total);

    for (row, &label) in labels.iter().enumerate() {
        if label >= n_clusters {
            continue;
        }
        sizes[label] += 1;
        if let Some(col) = value_column {
            sums[label] += raw[[row, col]];
        }
    }

    let global_mean = value_column.and_then(|col| raw.column(col).mean());

    (0..n_clusters)
        .map(|c| {
            let ratio = if total > 0 {
                sizes[c] as f64 / total as f64
            } else {
                0.0
            };
            let name = match global_mean {
                Some(global) => {
                    let mean = if sizes[c] > 0 {
                        sums[c] / sizes[c] as f64
                    } else {
                        0.0
                    };
                    value_tier_name(mean, global, ratio)
                }
                None => size_tier_name(ratio),
            };
            name.to_string()
        })
        .collect()
}

/// Name from a cluster's value mean relative to the global mean
pub fn value_tier_name(mean: f64, global_mean: f64, ratio: f64) -> &'static str {
    if mean > 1.5 * global_mean {
        if ratio > 0.15 {
            "High Value"
        } else {
            "Premium"
        }
    } else if mean > 0.8 * global_mean {
        if ratio > 0.25 {
            "Core Customers"
        } else {
            "Regular"
        }
    } else if mean > 0.3 * global_mean {
        "Potential Growth"
    } else if ratio > 0.2 {
        "Entry Level"
    } else {
        "At Risk"
    }
}

/// Name from a cluster's share of records alone
pub fn size_tier_name(ratio: f64) -> &'static str {
    if ratio > 0.3 {
        "Majority Segment"
    } else if ratio > 0.2 {
        "Significant Group"
    } else if ratio > 0.1 {
        "Niche Segment"
    } else {
        "Emerging Group"
    }
}
