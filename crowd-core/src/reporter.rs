//! Trait for reporting walk progress.

use crate::package::Package;
use crate::walker::GraphResult;

/// Observes the packages of a walk as they start and settle.
///
/// The core never writes to the terminal; front ends implement this trait.
pub trait WalkReporter: Send + Sync {
    /// Called right before the task of `package` runs.
    fn task_started(&self, package: &Package);

    /// Called when the task of `package` returned a result, and for packages
    /// that are skipped before the walk starts.
    fn task_finished(&self, package: &Package, result: &GraphResult);

    /// Called when the task of `package` failed, or when `package` is skipped
    /// because one of its dependencies failed.
    fn task_failed(&self, package: &Package, result: &GraphResult);
}

/// Reporter that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl WalkReporter for NoopReporter {
    fn task_started(&self, _package: &Package) {}

    fn task_finished(&self, _package: &Package, _result: &GraphResult) {}

    fn task_failed(&self, _package: &Package, _result: &GraphResult) {}
}
