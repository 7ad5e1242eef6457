//! Dependency graph management using petgraph.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{Error, Result};
use crate::package::Package;

/// A package vertex and the internal packages it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub name: String,
    pub index: NodeIndex,
    pub children: Vec<String>,
}

/// A node of the cycle search and the position of its next child.
struct Frame {
    node: NodeIndex,
    children: Vec<NodeIndex>,
    cursor: usize,
}

impl Frame {
    fn new(node: NodeIndex, children: Vec<NodeIndex>) -> Self {
        Self {
            node,
            children,
            cursor: 0,
        }
    }
}

/// Graph of the internal dependencies between the packages of a workspace.
///
/// Edges point from a package to the packages it depends on. Dependencies on
/// names that are not part of the registry are ignored. The graph is immutable
/// once built; cycles are only reported by [`DependencyGraph::check_cycles`].
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    node_map: HashMap<String, NodeIndex>,
    packages: IndexMap<String, Package>,
    roots: Vec<NodeIndex>,
    cycles_checked: AtomicBool,
}

impl DependencyGraph {
    /// Creates a new dependency graph from a package registry.
    pub fn new(packages: IndexMap<String, Package>) -> Self {
        let mut graph = DiGraph::with_capacity(packages.len(), packages.len());
        let mut node_map = HashMap::with_capacity(packages.len());

        for name in packages.keys() {
            let node = graph.add_node(name.clone());
            node_map.insert(name.clone(), node);
        }

        for (name, package) in &packages {
            let from = node_map[name];
            for dep_name in &package.deps {
                match node_map.get(dep_name) {
                    Some(&to) => {
                        graph.update_edge(from, to, ());
                    }
                    None => {
                        tracing::trace!(package = %name, dependency = %dep_name, "ignoring external dependency");
                    }
                }
            }
        }

        // A node is a root unless some other package depends on it.
        let roots: Vec<NodeIndex> = graph
            .node_indices()
            .filter(|&idx| {
                !graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .any(|parent| parent != idx)
            })
            .collect();

        tracing::debug!(
            packages = graph.node_count(),
            edges = graph.edge_count(),
            roots = roots.len(),
            "built dependency graph"
        );

        Self {
            graph,
            node_map,
            packages,
            roots,
            cycles_checked: AtomicBool::new(false),
        }
    }

    /// Creates a graph from a list of packages, keyed by package name.
    pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Self {
        Self::new(
            packages
                .into_iter()
                .map(|package| (package.name.clone(), package))
                .collect(),
        )
    }

    /// Verifies that the graph contains no dependency cycle.
    ///
    /// Once a check succeeds it is not repeated for this graph.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CycleDetected`] with the offending path, starting and
    /// ending with the same package.
    pub fn check_cycles(&self) -> Result<()> {
        if self.cycles_checked.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut verified = vec![false; self.graph.node_count()];
        let mut on_path = vec![false; self.graph.node_count()];

        // Nodes that are only reachable through a cycle have no root above
        // them, so every node is used as a starting point after the roots.
        for start in self.roots.iter().copied().chain(self.graph.node_indices()) {
            self.check_cycles_from(start, &mut verified, &mut on_path)?;
        }

        tracing::debug!("dependency graph is acyclic");
        self.cycles_checked.store(true, Ordering::Release);
        Ok(())
    }

    /// Depth-first search from `start` with an explicit stack, so long
    /// dependency chains do not grow the call stack.
    fn check_cycles_from(
        &self,
        start: NodeIndex,
        verified: &mut [bool],
        on_path: &mut [bool],
    ) -> Result<()> {
        if verified[start.index()] {
            return Ok(());
        }

        let mut stack = vec![Frame::new(start, self.children(start))];
        on_path[start.index()] = true;

        while let Some(frame) = stack.last_mut() {
            let current = frame.node;
            let next = frame.children.get(frame.cursor).copied();
            frame.cursor += 1;

            let Some(child) = next else {
                verified[current.index()] = true;
                on_path[current.index()] = false;
                stack.pop();
                continue;
            };

            if on_path[child.index()] {
                let found = stack
                    .iter()
                    .position(|frame| frame.node == child)
                    .unwrap_or(0);
                let mut cycle: Vec<String> = stack[found..]
                    .iter()
                    .map(|frame| self.graph[frame.node].clone())
                    .collect();
                cycle.push(self.graph[child].clone());
                return Err(Error::CycleDetected(cycle));
            }
            if verified[child.index()] {
                continue;
            }

            on_path[child.index()] = true;
            stack.push(Frame::new(child, self.children(child)));
        }
        Ok(())
    }

    /// Returns package names ordered so that every package comes before the
    /// packages it depends on.
    ///
    /// Reverse the result (or use [`DependencyGraph::build_order`]) to get
    /// dependencies first.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains a cycle.
    pub fn toposort(&self) -> Result<Vec<String>> {
        self.check_cycles()?;

        let mut pending: Vec<usize> = vec![0; self.graph.node_count()];
        for edge in self.graph.raw_edges() {
            pending[edge.target().index()] += 1;
        }

        let mut frontier: VecDeque<NodeIndex> = self.roots.iter().copied().collect();
        let mut result = Vec::with_capacity(self.graph.node_count());

        while let Some(node) = frontier.pop_front() {
            result.push(self.graph[node].clone());
            for child in self.children(node) {
                pending[child.index()] -= 1;
                if pending[child.index()] == 0 {
                    frontier.push_back(child);
                }
            }
        }

        if pending.iter().any(|&remaining| remaining > 0) {
            return Err(Error::UnresolvedDependencies);
        }

        Ok(result)
    }

    /// Returns package names with every dependency before its dependents.
    pub fn build_order(&self) -> Result<Vec<String>> {
        let mut order = self.toposort()?;
        order.reverse();
        Ok(order)
    }

    /// Retrieves a package by name.
    #[inline]
    pub fn get_package(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Returns all packages in registry order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Returns the packages matching `predicate`, in registry order.
    pub fn filter<P>(&self, mut predicate: P) -> Vec<&Package>
    where
        P: FnMut(&Package) -> bool,
    {
        self.packages.values().filter(|p| predicate(p)).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Names of the packages no other package depends on.
    pub fn roots(&self) -> Vec<&str> {
        self.roots.iter().map(|&idx| self.graph[idx].as_str()).collect()
    }

    /// Returns every node with its internal dependencies, in registry order.
    pub fn nodes(&self) -> Vec<GraphNode> {
        self.graph
            .node_indices()
            .map(|idx| GraphNode {
                name: self.graph[idx].clone(),
                index: idx,
                children: self
                    .children(idx)
                    .into_iter()
                    .map(|child| self.graph[child].clone())
                    .collect(),
            })
            .collect()
    }

    /// Returns direct internal dependencies of a package.
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found in the graph.
    pub fn dependencies(&self, package_name: &str) -> Result<Vec<String>> {
        let node = self.index_of(package_name)?;
        Ok(self
            .children(node)
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect())
    }

    /// Returns direct dependents of a package (packages that depend on it).
    ///
    /// # Errors
    ///
    /// Returns an error if the package is not found in the graph.
    pub fn dependents(&self, package_name: &str) -> Result<Vec<String>> {
        let node = self.index_of(package_name)?;
        let mut dependents: Vec<String> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|idx| self.graph[idx].clone())
            .collect();
        dependents.reverse();
        Ok(dependents)
    }

    fn index_of(&self, package_name: &str) -> Result<NodeIndex> {
        self.node_map
            .get(package_name)
            .copied()
            .ok_or_else(|| Error::PackageNotFound {
                name: package_name.to_string(),
                available: self.packages.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    pub(crate) fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Packages depending on `node`.
    pub(crate) fn parents(&self, node: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(node, Direction::Incoming)
    }

    /// Children in the order their dependencies were declared.
    pub(crate) fn children(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self.graph.neighbors(node).collect();
        children.reverse();
        children
    }

    pub(crate) fn package_at(&self, node: NodeIndex) -> &Package {
        &self.packages[node.index()]
    }
}
