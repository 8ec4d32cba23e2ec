use console::{style, StyledObject};

use crate::insights::{Health, Severity, Status};

/// Styling helpers for terminal output
pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

pub fn status(status: Status) -> StyledObject<String> {
    match status {
        Status::Success => bright_green("success"),
        Status::Error => bright_red("error"),
    }
}

pub fn health(health: Health) -> StyledObject<String> {
    match health {
        Health::Excellent => bright_green(health),
        Health::Good => bright_yellow(health),
        Health::NeedsImprovement => bright_red(health),
    }
}

pub fn availability(available: bool) -> StyledObject<String> {
    if available {
        bright_green("available")
    } else {
        bright_yellow("unavailable (static analysis only)")
    }
}

pub fn severity_color(severity: Severity) -> comfy_table::Color {
    match severity {
        Severity::Critical | Severity::High => comfy_table::Color::Red,
        Severity::Medium => comfy_table::Color::Yellow,
        Severity::Low | Severity::Info => comfy_table::Color::Green,
    }
}
