mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export;
pub use progress::PhaseProgress;
pub use styling::{dim, magenta_bold};
pub use summary::{
    print_documents, print_generate_summary, print_optimize_summary, print_review, print_stack,
    render_optimize_overview,
};

/// Prints the `PipeLens` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔍 PipeLens"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("CI/CD Pipeline Analysis & Generation")
    );
}
