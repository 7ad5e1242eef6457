//! Script and publish commands.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Result};
use crowd_core::{Error, RunSummary};

use crate::formatting::{format_duration, print_error, print_section_header, print_separator_with_spacing, print_success, print_summary_box, SectionStyle};

use super::progress_reporter::ProgressReporter;
use super::{create_runtime, load_workspace};

/// Prints the failure count of an aggregate walk error before it is returned.
fn report_failure(err: &Error) {
    if let Some(count) = err.failure_count() {
        print_error(&format!("{} packages failed", count));
        println!();
    }
}

fn print_duration(start: Instant) {
    print_separator_with_spacing();
    let duration_str = format_duration(start.elapsed().as_secs_f64());
    print_summary_box("Summary", &[("Duration", &duration_str)]);
    println!();
}

pub fn cmd_run(
    root: PathBuf,
    script: String,
    args: Vec<String>,
    no_progress: bool,
    with_root: bool,
) -> Result<()> {
    let start = Instant::now();
    let workspace = load_workspace(&root)?;

    print_section_header(
        &format!("running script {} in all packages", script),
        SectionStyle::Primary,
    );

    let reporter = ProgressReporter::new(workspace.packages().len(), !no_progress);
    let rt = create_runtime()?;
    let outcome: crowd_core::Result<RunSummary> = rt.block_on(async {
        if with_root {
            workspace
                .run_script_in_all_packages_with_root(&script, args.as_slice(), &reporter)
                .await
        } else {
            workspace
                .run_script_in_all_packages(&script, args.as_slice(), &reporter)
                .await
        }
    });
    reporter.finish();

    let summary = match outcome {
        Ok(summary) => summary,
        Err(err) => {
            println!();
            report_failure(&err);
            return Err(err.into());
        }
    };

    if summary.ran == 0 {
        bail!("could not find script {} in any of your packages", script);
    }

    println!();
    print_success(&format!(
        "Finished running the script {} for {} packages (skipped {} packages that don't have this script)",
        script, summary.ran, summary.skipped
    ));
    print_duration(start);

    Ok(())
}

pub fn cmd_publish(root: PathBuf, prerelease: Option<bool>, no_progress: bool) -> Result<()> {
    let start = Instant::now();
    let workspace = load_workspace(&root)?;

    let tag = match prerelease {
        Some(true) => format!(" (dist tag {})", workspace.config().prerelease_dist_tag),
        _ => String::new(),
    };
    print_section_header(
        &format!("publishing version {}{}", workspace.config().current_version, tag),
        SectionStyle::Primary,
    );

    let reporter = ProgressReporter::new(workspace.packages().len(), !no_progress);
    let rt = create_runtime()?;
    let outcome = rt.block_on(workspace.publish_all_packages(prerelease, &reporter));
    reporter.finish();

    let summary = match outcome {
        Ok(summary) => summary,
        Err(err) => {
            println!();
            report_failure(&err);
            return Err(err.into());
        }
    };

    println!();
    print_success(&format!(
        "Published {} packages (skipped {} private packages)",
        summary.ran, summary.skipped
    ));
    print_duration(start);

    Ok(())
}
