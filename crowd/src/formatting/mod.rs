//! CLI output formatting.

mod headers;
mod output;
mod progress;
mod status;
mod tables;

pub use headers::{print_section_header, SectionStyle};
pub use output::{format_duration, print_key_value, print_separator_with_spacing, print_summary_box};
pub use progress::{create_progress_bar, create_spinner};
pub use status::{print_error, print_success, print_warning, Status};
pub use tables::print_package_table;
