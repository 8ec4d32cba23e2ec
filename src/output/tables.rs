use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use super::styling::severity_color;
use crate::insights::{Level, Severity};
use crate::pipeline::Thresholds;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn color_coded_score_cell(score: f64) -> Cell {
    let text = format!("{score:.1}");
    if score >= Thresholds::DEFAULT.excellent_score {
        Cell::new(text).fg(TableColor::Green)
    } else if score >= Thresholds::DEFAULT.good_score {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}

pub fn color_coded_confidence_cell(confidence: f64) -> Cell {
    let text = format!("{:.0}%", confidence * 100.0);
    if confidence >= 0.7 {
        Cell::new(text).fg(TableColor::Green)
    } else if confidence >= 0.4 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::DarkGrey)
    }
}

pub fn severity_cell(severity: Severity) -> Cell {
    Cell::new(severity).fg(severity_color(severity))
}

pub fn level_cell(level: Level) -> Cell {
    let color = match level {
        Level::Low => TableColor::Green,
        Level::Medium => TableColor::Yellow,
        Level::High => TableColor::Red,
    };
    Cell::new(level).fg(color)
}
