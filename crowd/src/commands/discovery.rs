//! Discovery and inspection commands.

use std::path::PathBuf;

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::formatting::{print_key_value, print_package_table, print_section_header, print_warning, SectionStyle};

use super::load_workspace;

pub fn cmd_list(root: PathBuf, toposort: bool, json: bool) -> Result<()> {
    let workspace = load_workspace(&root)?;
    let names = workspace.list_packages(toposort)?;

    if json {
        let graph = workspace.graph();
        let mut entries = Vec::with_capacity(names.len());
        for name in &names {
            let Some(package) = workspace.packages().get(name) else {
                continue;
            };
            entries.push(serde_json::json!({
                "name": package.name,
                "path": package.path.display().to_string(),
                "version": package.version,
                "dependencies": graph.dependencies(name)?,
            }));
        }
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for name in names {
            println!("{}", name);
        }
    }

    Ok(())
}

pub fn cmd_graph(root: PathBuf) -> Result<()> {
    let workspace = load_workspace(&root)?;
    let graph = workspace.graph();
    graph.check_cycles()?;

    print_section_header("[Dependency Graph]", SectionStyle::Primary);

    if graph.is_empty() {
        print_warning("No packages found");
        println!();
        return Ok(());
    }

    print_key_value("Roots:", &graph.roots().join(", "));
    print_key_value("Packages:", &graph.len().to_string());
    println!();

    let mut rows = Vec::with_capacity(graph.len());
    for name in graph.build_order()? {
        let version = graph
            .get_package(&name)
            .and_then(|package| package.version.clone())
            .unwrap_or_else(|| "-".bright_black().to_string());
        let dependencies = graph.dependencies(&name)?;
        rows.push((name, version, dependencies));
    }
    print_package_table(&rows);
    println!();

    Ok(())
}
