use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

pub fn build_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).fg(Color::Cyan).add_attribute(Attribute::Bold)),
        );
    table
}

pub fn text_cell(value: impl ToString) -> Cell {
    Cell::new(value.to_string())
}

/// Right-aligned, for buckets, counts and timestamps.
pub fn numeric_cell(value: impl ToString) -> Cell {
    Cell::new(value.to_string()).set_alignment(CellAlignment::Right)
}

pub fn average_cell(average: Option<f64>) -> Cell {
    match average {
        Some(a) => numeric_cell(format!("{a:.4}")),
        None => Cell::new("-").fg(Color::DarkGrey),
    }
}
