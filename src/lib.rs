//! Survey Insight - preprocessing and scale reliability for survey exports
//!
//! Converts a raw survey CSV into an Arrow snapshot, recodes sentinel codes to
//! missing, checks scale reliability with Cronbach's alpha, and builds the
//! centered composites and interaction term used by downstream moderation
//! models.

pub mod arrow_handler;
pub mod compose;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod loader;
pub mod logging;
pub mod recode;
pub mod reliability;
pub mod report;
pub mod stats;
pub mod utils;

pub use compose::{compose, AnalysisFrame, CenteringMeans, Composition};
pub use config::{MissingCodePolicy, ScaleDefinition, ScaleRole, StudyConfig};
pub use dataset::{Column, ColumnData, ColumnType, Table};
pub use engine::{PipelineObserver, PreprocessEngine, PreprocessOutcome, TracingObserver};
pub use recode::{recode_missing, RecodeReport};
pub use reliability::{compute_alpha, ReliabilityAnalyzer, ReliabilityReport, ReliabilityResult};
pub use stats::Statistics;
pub use utils::PipelineError;

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
