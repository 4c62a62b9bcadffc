/// Utility modules for error handling, numeric coercion and centering
pub mod error;
pub mod scaling;
pub mod type_convert;

// Re-export commonly used types
pub use error::PipelineError;
pub use scaling::{mean_center, sample_variance, stable_mean};
pub use type_convert::{finite_or_missing, format_optional, parse_integer, parse_numeric};
