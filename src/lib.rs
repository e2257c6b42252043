//! CustInsight: customer analytics over schema-less CSV tables
//!
//! The pipeline infers field roles from column names, extracts numeric
//! features, segments customers with rule-based RFM scoring or K-Means
//! clustering, and aggregates everything into a chart-ready snapshot.

pub mod cli;
pub mod config;
pub mod data;
pub mod features;
pub mod fields;
pub mod insights;
pub mod model;
pub mod report;
pub mod rfm;
pub mod sample;
pub mod segment;
pub mod trend;

// Re-export public items for easier access
pub use cli::Args;
pub use config::AnalysisConfig;
pub use data::{load_table, Table};
pub use fields::{classify, FieldRoles};
pub use insights::{analyze, Analysis, InsightsSnapshot};
pub use model::{fit_kmeans, KMeansModel};
pub use segment::{segment, SegmentAssignment, Strategy};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
