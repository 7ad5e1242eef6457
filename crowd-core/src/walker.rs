//! Dependency-ordered task execution across the package graph.
//!
//! A walk runs one task per package. Dependencies always settle before their
//! dependents start, independent subtrees run concurrently, and a package that
//! fails makes everything depending on it resolve as skipped.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;

use crate::error::{Error, Result, TaskFailure};
use crate::graph::DependencyGraph;
use crate::package::Package;

/// Skip reason of packages whose dependency failed.
pub const DEPENDENCY_FAILURE: &str = "dependency failure";

/// Outcome of the task of a single package.
#[derive(Debug, Clone)]
pub enum TaskStatus {
    Success,
    Skipped { reason: Option<String> },
    Error { cause: Arc<Error> },
}

/// Result of one package in a walk.
#[derive(Debug, Clone)]
pub struct GraphResult {
    pub status: TaskStatus,
    /// Whether the packages depending on this one must be skipped.
    pub cascades_failure: bool,
}

impl Default for GraphResult {
    fn default() -> Self {
        Self::success()
    }
}

impl GraphResult {
    pub fn success() -> Self {
        Self {
            status: TaskStatus::Success,
            cascades_failure: false,
        }
    }

    pub fn skipped(reason: Option<String>) -> Self {
        Self {
            status: TaskStatus::Skipped { reason },
            cascades_failure: false,
        }
    }

    /// A failed result. Failures cascade to dependents.
    pub fn error(cause: impl Into<Arc<Error>>) -> Self {
        Self {
            status: TaskStatus::Error {
                cause: cause.into(),
            },
            cascades_failure: true,
        }
    }

    pub fn with_cascade(mut self, cascades_failure: bool) -> Self {
        self.cascades_failure = cascades_failure;
        self
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskStatus::Success)
    }

    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, TaskStatus::Skipped { .. })
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        matches!(self.status, TaskStatus::Error { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match &self.status {
            TaskStatus::Skipped { reason } => reason.as_deref(),
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&Arc<Error>> {
        match &self.status {
            TaskStatus::Error { cause } => Some(cause),
            _ => None,
        }
    }
}

/// Per-package results of a finished walk.
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    results: IndexMap<String, GraphResult>,
    failures: usize,
    last_failure: Option<TaskFailure>,
    linear: bool,
}

impl WalkReport {
    /// Result of a package, if the walk reached it.
    pub fn get(&self, package: &str) -> Option<&GraphResult> {
        self.results.get(package)
    }

    /// Results in the order packages settled.
    pub fn results(&self) -> impl Iterator<Item = (&str, &GraphResult)> {
        self.results.iter().map(|(name, result)| (name.as_str(), result))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of tasks that failed.
    pub fn failure_count(&self) -> usize {
        self.failures
    }

    /// The failure that settled last.
    ///
    /// With several independent failures in one walk, which of them settles
    /// last depends on scheduling.
    pub fn last_failure(&self) -> Option<&TaskFailure> {
        self.last_failure.as_ref()
    }

    /// Turns a report with failed tasks into the aggregate walk error.
    pub fn into_result(self) -> Result<Self> {
        match self.last_failure {
            Some(last_failure) if self.failures > 0 => {
                let count = self.failures;
                if self.linear {
                    Err(Error::LinearWalk {
                        count,
                        last_failure,
                    })
                } else {
                    Err(Error::GraphWalk {
                        count,
                        last_failure,
                    })
                }
            }
            _ => Ok(self),
        }
    }
}

type FailureObserver<'a> = Box<dyn Fn(&Package, &GraphResult) + Send + Sync + 'a>;

#[derive(Default)]
struct WalkState {
    failures: usize,
    last_failure: Option<TaskFailure>,
    results: IndexMap<String, GraphResult>,
}

impl WalkState {
    fn record_failure(&mut self, package: &str, error: Arc<Error>) {
        self.failures += 1;
        self.last_failure = Some(TaskFailure {
            package: package.to_string(),
            error,
        });
    }

    fn record_result(&mut self, package: &str, result: &GraphResult) {
        self.results.insert(package.to_string(), result.clone());
    }

    fn into_report(self, linear: bool) -> WalkReport {
        WalkReport {
            results: self.results,
            failures: self.failures,
            last_failure: self.last_failure,
            linear,
        }
    }
}

/// Dependency bookkeeping of a concurrent walk.
///
/// A package becomes ready once every one of its dependencies settled.
struct Schedule {
    settled: Vec<Option<GraphResult>>,
    pending: Vec<usize>,
    ready: VecDeque<NodeIndex>,
}

impl Schedule {
    fn new(graph: &DependencyGraph) -> Self {
        let pending: Vec<usize> = graph
            .node_indices()
            .map(|node| graph.children(node).len())
            .collect();
        let ready = graph
            .node_indices()
            .filter(|node| pending[node.index()] == 0)
            .collect();
        Self {
            settled: vec![None; pending.len()],
            pending,
            ready,
        }
    }

    fn dependency_failed(&self, graph: &DependencyGraph, node: NodeIndex) -> bool {
        graph.children(node).iter().any(|child| {
            self.settled[child.index()]
                .as_ref()
                .is_some_and(|result| result.cascades_failure)
        })
    }

    fn settle(&mut self, graph: &DependencyGraph, node: NodeIndex, result: GraphResult) {
        self.settled[node.index()] = Some(result);
        for parent in graph.parents(node) {
            self.pending[parent.index()] -= 1;
            if self.pending[parent.index()] == 0 {
                self.ready.push_back(parent);
            }
        }
    }
}

/// Runs a task for every package of a [`DependencyGraph`].
pub struct GraphWalker<'a> {
    graph: &'a DependencyGraph,
    skip: HashSet<String>,
    on_task_failure: Option<FailureObserver<'a>>,
}

impl<'a> GraphWalker<'a> {
    pub fn new(graph: &'a DependencyGraph) -> Self {
        Self {
            graph,
            skip: HashSet::new(),
            on_task_failure: None,
        }
    }

    /// Packages that resolve as success without running their task.
    ///
    /// A skipped package whose dependency failed resolves as skipped instead
    /// and does not pass the failure on to its dependents.
    pub fn with_skip<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(names.into_iter().map(Into::into));
        self
    }

    /// Observes every failed task and every package skipped because of a
    /// failed dependency.
    pub fn on_task_failure<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Package, &GraphResult) + Send + Sync + 'a,
    {
        self.on_task_failure = Some(Box::new(observer));
        self
    }

    /// Walks the graph and fails with [`Error::GraphWalk`] if any task failed.
    ///
    /// Cycles are checked first; a cyclic graph never runs a task.
    pub async fn walk<F, Fut>(&self, task: F) -> Result<WalkReport>
    where
        F: Fn(&'a Package) -> Fut + Sync,
        Fut: Future<Output = Result<GraphResult>> + Send,
    {
        self.walk_report(task).await?.into_result()
    }

    /// Walks the graph and returns every package result, failed tasks
    /// included.
    ///
    /// # Errors
    ///
    /// Only fails, before running anything, if the graph contains a cycle.
    pub async fn walk_report<F, Fut>(&self, task: F) -> Result<WalkReport>
    where
        F: Fn(&'a Package) -> Fut + Sync,
        Fut: Future<Output = Result<GraphResult>> + Send,
    {
        self.graph.check_cycles()?;
        Ok(self.execute(&task).await)
    }

    /// Runs every task one at a time in build order, without cascading.
    ///
    /// Fails with [`Error::LinearWalk`] once the whole sequence was processed
    /// if any task failed.
    pub async fn walk_linear<F, Fut>(&self, task: F) -> Result<WalkReport>
    where
        F: Fn(&'a Package) -> Fut,
        Fut: Future<Output = Result<GraphResult>>,
    {
        let graph: &'a DependencyGraph = self.graph;
        let order = graph.build_order()?;
        let mut state = WalkState::default();

        for name in &order {
            let Some(package) = graph.get_package(name) else {
                continue;
            };

            let result = if self.skip.contains(name) {
                GraphResult::success()
            } else {
                tracing::debug!(package = %name, "running task");
                match task(package).await {
                    Ok(result) => result,
                    Err(e) => self.fail(&mut state, package, e),
                }
            };
            state.record_result(name, &result);
        }

        state.into_report(true).into_result()
    }

    /// Starts every package as soon as its dependencies settled and polls the
    /// running tasks side by side.
    async fn execute<F, Fut>(&self, task: &F) -> WalkReport
    where
        F: Fn(&'a Package) -> Fut,
        Fut: Future<Output = Result<GraphResult>>,
    {
        let graph: &'a DependencyGraph = self.graph;
        let mut state = WalkState::default();
        let mut schedule = Schedule::new(graph);
        let mut running = FuturesUnordered::new();

        loop {
            while let Some(node) = schedule.ready.pop_front() {
                let package = graph.package_at(node);
                let skipped = self.skip.contains(&package.name);

                let result = if schedule.dependency_failed(graph, node) {
                    if skipped {
                        GraphResult::skipped(None)
                    } else {
                        tracing::debug!(package = %package.name, "skipping after dependency failure");
                        let result = GraphResult::skipped(Some(DEPENDENCY_FAILURE.to_string()))
                            .with_cascade(true);
                        self.notify_failure(package, &result);
                        result
                    }
                } else if skipped {
                    GraphResult::success()
                } else {
                    tracing::debug!(package = %package.name, "running task");
                    running.push(task(package).map(move |outcome| (node, outcome)));
                    continue;
                };

                self.record(&mut state, &mut schedule, node, result);
            }

            let Some((node, outcome)) = running.next().await else {
                break;
            };
            let result = match outcome {
                Ok(result) => result,
                Err(e) => self.fail(&mut state, graph.package_at(node), e),
            };
            self.record(&mut state, &mut schedule, node, result);
        }

        state.into_report(false)
    }

    fn record(
        &self,
        state: &mut WalkState,
        schedule: &mut Schedule,
        node: NodeIndex,
        result: GraphResult,
    ) {
        let package = self.graph.package_at(node);
        tracing::trace!(package = %package.name, status = ?result.status, "package settled");
        state.record_result(&package.name, &result);
        schedule.settle(self.graph, node, result);
    }

    fn fail(&self, state: &mut WalkState, package: &Package, error: Error) -> GraphResult {
        tracing::debug!(package = %package.name, error = %error, "task failed");
        let error = Arc::new(error);
        state.record_failure(&package.name, Arc::clone(&error));
        let result = GraphResult::error(error);
        self.notify_failure(package, &result);
        result
    }

    fn notify_failure(&self, package: &Package, result: &GraphResult) {
        if let Some(observer) = &self.on_task_failure {
            observer(package, result);
        }
    }
}
