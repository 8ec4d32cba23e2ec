use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use super::styling::{bright, bright_green, bright_yellow};

/// Spinner-per-phase progress on stderr for multi-phase commands.
pub struct PhaseProgress {
    pb: ProgressBar,
    phase: usize,
    total: usize,
    label: String,
}

impl PhaseProgress {
    pub fn start(total: usize, label: impl Into<String>) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Phases").underlined());
        Self::spawn(1, total, label.into())
    }

    fn spawn(phase: usize, total: usize, label: String) -> Self {
        let pb = create_spinner(bright_yellow(format!("Phase {phase}/{total}: {label}")).to_string());
        Self {
            pb,
            phase,
            total,
            label,
        }
    }

    fn complete(&self) {
        self.pb.finish_with_message(
            bright_green(format!("Phase {}/{}: {} ✓", self.phase, self.total, self.label))
                .to_string(),
        );
    }

    /// Marks the current phase done and starts the next one.
    pub fn next(self, label: impl Into<String>) -> Self {
        self.complete();
        Self::spawn((self.phase + 1).min(self.total), self.total, label.into())
    }

    pub fn finish(self) {
        self.complete();
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template("  {msg} {spinner}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
