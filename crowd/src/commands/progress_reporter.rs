//! Terminal reporter for package walks.

use std::collections::HashMap;
use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

use crowd_core::{GraphResult, Package, WalkReporter};
use indicatif::{MultiProgress, ProgressBar};

use crate::formatting::{create_progress_bar, create_spinner, Status};

/// Shows a spinner per running package above an overall progress bar, and
/// one status line per settled package.
///
/// Without a terminal, or with progress disabled, only the status lines are
/// printed.
pub struct ProgressReporter {
    multi: Option<MultiProgress>,
    overall: Option<ProgressBar>,
    spinners: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressReporter {
    pub fn new(total: usize, enabled: bool) -> Self {
        if !enabled || !std::io::stderr().is_terminal() {
            return Self {
                multi: None,
                overall: None,
                spinners: Mutex::new(HashMap::new()),
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(create_progress_bar(total as u64));
        Self {
            multi: Some(multi),
            overall: Some(overall),
            spinners: Mutex::new(HashMap::new()),
        }
    }

    /// Removes every remaining bar from the terminal.
    pub fn finish(&self) {
        if let Ok(mut spinners) = self.spinners.lock() {
            for (_, spinner) in spinners.drain() {
                spinner.finish_and_clear();
            }
        }
        if let Some(overall) = &self.overall {
            overall.finish_and_clear();
        }
    }

    fn print_line(&self, line: String) {
        match &self.multi {
            Some(multi) => {
                if multi.println(&line).is_err() {
                    println!("{}", line);
                }
            }
            None => println!("{}", line),
        }
    }

    fn settle(&self, package: &Package) {
        if let Ok(mut spinners) = self.spinners.lock() {
            if let Some(spinner) = spinners.remove(&package.name) {
                spinner.finish_and_clear();
            }
        }
        if let Some(overall) = &self.overall {
            overall.inc(1);
        }
    }
}

impl WalkReporter for ProgressReporter {
    fn task_started(&self, package: &Package) {
        tracing::debug!(package = %package.name, "task started");
        let Some(multi) = &self.multi else {
            return;
        };

        let spinner = multi.add(create_spinner(&package.name));
        spinner.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut spinners) = self.spinners.lock() {
            spinners.insert(package.name.clone(), spinner);
        }
    }

    fn task_finished(&self, package: &Package, result: &GraphResult) {
        self.settle(package);
        let line = match result.reason() {
            Some(reason) => Status::Skipped.format(&format!("{} ({})", package.name, reason)),
            None if result.is_skipped() => Status::Skipped.format(&package.name),
            None => Status::Success.format(&package.name),
        };
        self.print_line(line);
    }

    fn task_failed(&self, package: &Package, result: &GraphResult) {
        self.settle(package);
        let line = match (result.cause(), result.reason()) {
            (Some(cause), _) => Status::Error.format(&format!("{}: {}", package.name, cause)),
            (None, Some(reason)) => Status::Skipped.format(&format!("{} ({})", package.name, reason)),
            (None, None) => Status::Error.format(&package.name),
        };
        self.print_line(line);
    }
}
