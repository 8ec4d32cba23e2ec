mod fallback;
pub mod spec;
mod synthesizer;
pub mod templates;

pub use spec::{validate_dependencies, PipelineSpecification};
pub use synthesizer::{Requirements, SpecificationSynthesizer};
pub use templates::render;
