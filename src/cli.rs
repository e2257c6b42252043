//! Command-line interface definitions and argument parsing

use chrono::{NaiveDate, Utc};
use clap::Parser;

use crate::config::{
    AnalysisConfig, DEFAULT_MAX_CLUSTERS, DEFAULT_MAX_ITERATIONS, DEFAULT_SEED,
    DEFAULT_SILHOUETTE_SAMPLE,
};
use crate::segment::Strategy;

/// Customer insights CLI: field detection, RFM / K-Means segmentation and trends
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "data.csv")]
    pub input: String,

    /// Segmentation strategy
    #[arg(short, long, value_enum, default_value_t = Strategy::KMeans)]
    pub strategy: Strategy,

    /// Upper bound for the number of K-Means clusters
    #[arg(short = 'k', long, default_value_t = DEFAULT_MAX_CLUSTERS)]
    pub clusters: usize,

    /// Maximum iterations for K-Means algorithm
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iters: usize,

    /// Seed for every random draw of the run
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Column with days since last activity (RFM strategy)
    #[arg(long)]
    pub recency_field: Option<String>,

    /// Column with purchase counts (RFM strategy)
    #[arg(long)]
    pub frequency_field: Option<String>,

    /// Reference date (YYYY-MM-DD) for synthetic trends and sample data; defaults to today
    #[arg(long)]
    pub as_of: Option<String>,

    /// Output path for the JSON snapshot (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Analyze N generated sample customers instead of reading the input file
    #[arg(long)]
    pub sample: Option<usize>,

    /// Write the generated sample customers to this CSV path
    #[arg(long, requires = "sample")]
    pub write_sample: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the reference date, defaulting to today (UTC)
    pub fn reference_date(&self) -> crate::Result<NaiveDate> {
        match self.as_of {
            Some(ref raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("Invalid --as-of date (expected YYYY-MM-DD): {}", raw)),
            None => Ok(Utc::now().date_naive()),
        }
    }

    /// Validate the arguments and build the analysis settings
    pub fn to_config(&self) -> crate::Result<AnalysisConfig> {
        if self.clusters == 0 {
            anyhow::bail!("Number of clusters must be at least 1");
        }
        if self.max_iters == 0 {
            anyhow::bail!("Maximum iterations must be at least 1");
        }
        if self.strategy == Strategy::KMeans
            && (self.recency_field.is_some() || self.frequency_field.is_some())
        {
            log::warn!("--recency-field / --frequency-field only apply to the rfm strategy");
        }

        Ok(AnalysisConfig {
            strategy: self.strategy,
            max_clusters: self.clusters,
            max_iterations: self.max_iters,
            seed: self.seed,
            recency_field: self.recency_field.clone(),
            frequency_field: self.frequency_field.clone(),
            reference_date: self.reference_date()?,
            silhouette_sample: DEFAULT_SILHOUETTE_SAMPLE,
        })
    }
}
