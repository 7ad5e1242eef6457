//! Table formatting utilities using comfy-table.

use comfy_table::{Cell, Table};
use owo_colors::OwoColorize;

/// Prints packages with their version and internal dependencies.
pub fn print_package_table(rows: &[(String, String, Vec<String>)]) {
    let mut table = Table::new();
    table
        .set_header(vec![
            Cell::new("Package").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Version").add_attribute(comfy_table::Attribute::Bold),
            Cell::new("Depends on").add_attribute(comfy_table::Attribute::Bold),
        ])
        .load_preset(comfy_table::presets::UTF8_FULL)
        .apply_modifier(comfy_table::modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic);

    for (name, version, dependencies) in rows {
        let dependencies = if dependencies.is_empty() {
            "(none)".bright_black().to_string()
        } else {
            dependencies.join(", ")
        };
        table.add_row(vec![
            Cell::new(name).fg(comfy_table::Color::White),
            Cell::new(version).fg(comfy_table::Color::DarkGrey),
            Cell::new(dependencies),
        ]);
    }

    println!("{}", table);
}
