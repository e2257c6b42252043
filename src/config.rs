//! Analysis settings shared by the library and the CLI

use chrono::{NaiveDate, Utc};

use crate::segment::Strategy;

/// Upper bound for k
pub const DEFAULT_MAX_CLUSTERS: usize = 5;
/// K-Means iteration cap
pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_SEED: u64 = 42;
/// Points used for the sampled silhouette score
pub const DEFAULT_SILHOUETTE_SAMPLE: usize = 100;

/// Settings for one analysis run
///
/// All randomness of a run (k-means++ seeding, placeholder RFM values,
/// trend jitter, scatter placeholders) is drawn from one generator seeded
/// with `seed`, so equal configs on equal tables give equal snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub strategy: Strategy,
    pub max_clusters: usize,
    pub max_iterations: usize,
    pub seed: u64,
    /// Column holding days since last activity (RFM mode)
    pub recency_field: Option<String>,
    /// Column holding purchase counts (RFM mode)
    pub frequency_field: Option<String>,
    /// Last month of the synthetic trend
    ///
    /// `Default` sets this to today (UTC), so synthetic month labels of a
    /// default config change with the calendar. Pin it with
    /// [`AnalysisConfig::with_reference_date`] for stable output.
    pub reference_date: NaiveDate,
    pub silhouette_sample: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            strategy: Strategy::default(),
            max_clusters: DEFAULT_MAX_CLUSTERS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed: DEFAULT_SEED,
            recency_field: None,
            frequency_field: None,
            reference_date: Utc::now().date_naive(),
            silhouette_sample: DEFAULT_SILHOUETTE_SAMPLE,
        }
    }
}

impl AnalysisConfig {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = date;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reference_date_is_today() {
        let before = Utc::now().date_naive();
        let config = AnalysisConfig::default();
        let after = Utc::now().date_naive();

        assert!(config.reference_date >= before && config.reference_date <= after);
    }

    #[test]
    fn test_reference_date_can_be_pinned() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let config = AnalysisConfig::default().with_reference_date(date);

        assert_eq!(config.reference_date, date);
        assert_eq!(config.max_clusters, DEFAULT_MAX_CLUSTERS);
    }
}
