mod classifier;
mod document;
pub mod metrics;
mod scanner;
mod structure;

pub use document::PipelineDocument;
pub use metrics::{
    calculate_generation_metrics, calculate_optimization_metrics, calculate_review_metrics,
    Thresholds,
};
pub use scanner::scan;
pub use structure::analyze_structure;
