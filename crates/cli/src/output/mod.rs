mod format;
mod table;

pub use format::{
    format_bytes, print_error, print_info, print_json, print_success, print_warning, OutputMode,
};
pub use table::{average_cell, build_table, numeric_cell, text_cell};
