mod detector;
pub mod signatures;
mod tree;

pub use detector::detect_tech_stack;
pub use tree::collect_paths;
