//! Dependency graph implementation using petgraph.
//!
//! Provides a directed graph over installed packages, keyed by package
//! name, whose edges are the dependencies each package declares and that
//! resolve to an installed package.

use petgraph::algo::{is_cyclic_directed, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::parser::DependencyType;
use crate::store::{Package, PackageIndex};

/// Represents a node in the dependency graph.
///
/// Each node is the installed package a bare name resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// Package name (e.g., "react", "@babel/core")
    pub name: String,
    /// Installed version
    pub version: String,
    /// Relationship to the root project
    pub dep_type: DependencyType,
    /// Installed size in bytes
    pub size: u64,
}

impl DependencyNode {
    /// Creates a new dependency node.
    ///
    /// # Example
    ///
    /// ```rust
    /// use depscope::graph::DependencyNode;
    /// use depscope::parser::DependencyType;
    ///
    /// let node = DependencyNode::new("react", "18.2.0", DependencyType::Production, 1024);
    /// assert_eq!(node.name, "react");
    /// assert_eq!(node.size, 1024);
    /// ```
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        dep_type: DependencyType,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dep_type,
            size,
        }
    }
}

impl From<&Package> for DependencyNode {
    fn from(pkg: &Package) -> Self {
        Self::new(&pkg.name, &pkg.version, pkg.classification, pkg.size)
    }
}

/// A directed graph of package dependencies.
///
/// Nodes are unique by name. Edges point from a package to each package
/// it declares in its `dependencies` section.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// The underlying petgraph directed graph
    graph: DiGraph<DependencyNode, ()>,
    /// Map from package name to node index for quick lookups
    node_indices: HashMap<String, NodeIndex>,
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyGraph {
    /// Creates a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_indices: HashMap::new(),
        }
    }

    /// Creates a new graph with pre-allocated capacity.
    pub fn with_capacity(nodes: usize, edges: usize) -> Self {
        Self {
            graph: DiGraph::with_capacity(nodes, edges),
            node_indices: HashMap::with_capacity(nodes),
        }
    }

    /// Builds the graph from a package index.
    ///
    /// Each name becomes one node (the version the index resolves it to).
    /// Declared dependencies that are not installed produce no edge.
    pub fn from_index(index: &PackageIndex) -> Self {
        let mut graph = Self::with_capacity(index.name_count(), index.len());

        for pkg in index {
            if !graph.contains(&pkg.name) {
                graph.add_node(DependencyNode::from(pkg));
            }
        }

        for pkg in index {
            let Some(resolved) = index.get(&pkg.name) else {
                continue;
            };
            if resolved.version != pkg.version {
                continue;
            }
            for dep in &pkg.dependencies {
                graph.add_edge(&pkg.name, dep);
            }
        }

        graph
    }

    /// Adds a node, returning its index.
    ///
    /// If a node with the same name exists it is kept and its index is
    /// returned.
    pub fn add_node(&mut self, node: DependencyNode) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(&node.name) {
            return idx;
        }
        let name = node.name.clone();
        let idx = self.graph.add_node(node);
        self.node_indices.insert(name, idx);
        idx
    }

    /// Adds an edge `from -> to`.
    ///
    /// Returns `false` if either package is missing.
    ///
    /// # Example
    ///
    /// ```rust
    /// use depscope::graph::{DependencyGraph, DependencyNode};
    /// use depscope::parser::DependencyType;
    ///
    /// let mut graph = DependencyGraph::new();
    /// graph.add_node(DependencyNode::new("react-dom", "18.2.0", DependencyType::Production, 10));
    /// graph.add_node(DependencyNode::new("react", "18.2.0", DependencyType::Production, 5));
    ///
    /// assert!(graph.add_edge("react-dom", "react"));
    /// assert!(!graph.add_edge("react-dom", "scheduler"));
    /// assert_eq!(graph.edge_count(), 1);
    /// ```
    pub fn add_edge(&mut self, from: &str, to: &str) -> bool {
        let (Some(&from_idx), Some(&to_idx)) =
            (self.node_indices.get(from), self.node_indices.get(to))
        else {
            return false;
        };
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
        true
    }

    /// Gets a node by package name.
    pub fn get_node(&self, name: &str) -> Option<&DependencyNode> {
        self.node_indices
            .get(name)
            .and_then(|&idx| self.graph.node_weight(idx))
    }

    /// Gets the dependencies of a package (outgoing edges).
    pub fn get_dependencies(&self, name: &str) -> Vec<&DependencyNode> {
        self.neighbors(name, Direction::Outgoing)
    }

    /// Gets the dependents of a package (incoming edges).
    pub fn get_dependents(&self, name: &str) -> Vec<&DependencyNode> {
        self.neighbors(name, Direction::Incoming)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&DependencyNode> {
        let Some(&idx) = self.node_indices.get(name) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(idx, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                self.graph.node_weight(other)
            })
            .collect()
    }

    /// Checks if the graph contains cycles.
    ///
    /// # Example
    ///
    /// ```rust
    /// use depscope::graph::{DependencyGraph, DependencyNode};
    /// use depscope::parser::DependencyType;
    ///
    /// let mut graph = DependencyGraph::new();
    /// graph.add_node(DependencyNode::new("a", "1.0.0", DependencyType::Transitive, 0));
    /// graph.add_node(DependencyNode::new("b", "1.0.0", DependencyType::Transitive, 0));
    /// graph.add_edge("a", "b");
    /// assert!(!graph.has_cycles());
    ///
    /// graph.add_edge("b", "a");
    /// assert!(graph.has_cycles());
    /// ```
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Detects circular dependencies.
    ///
    /// Every strongly connected component with more than one package, or
    /// a single package depending on itself, is reported once. Results
    /// are ordered by their first member's name.
    pub fn detect_cycles(&self) -> Vec<CycleInfo> {
        let mut cycles = Vec::new();

        for scc in tarjan_scc(&self.graph) {
            let is_cycle = scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]);
            if !is_cycle {
                continue;
            }

            let start = scc
                .iter()
                .copied()
                .min_by(|a, b| self.graph[*a].name.cmp(&self.graph[*b].name))
                .unwrap_or(scc[0]);
            let members: HashSet<NodeIndex> = scc.iter().copied().collect();

            let mut names: Vec<String> =
                scc.iter().map(|&idx| self.graph[idx].name.clone()).collect();
            names.sort();

            let path = self
                .shortest_cycle(start, &members)
                .into_iter()
                .map(|idx| self.graph[idx].name.clone())
                .collect();

            cycles.push(CycleInfo {
                members: names,
                path,
            });
        }

        cycles.sort_by(|a, b| a.members.cmp(&b.members));
        cycles
    }

    /// Breadth-first search for the shortest loop through `start` that
    /// stays within `members`.
    fn shortest_cycle(&self, start: NodeIndex, members: &HashSet<NodeIndex>) -> Vec<NodeIndex> {
        let mut prev: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for next in self.graph.neighbors_directed(current, Direction::Outgoing) {
                if !members.contains(&next) {
                    continue;
                }
                if next == start {
                    let mut path = vec![current];
                    let mut cursor = current;
                    while cursor != start {
                        match prev.get(&cursor) {
                            Some(&p) => {
                                path.push(p);
                                cursor = p;
                            }
                            None => break,
                        }
                    }
                    path.reverse();
                    return path;
                }
                if let std::collections::hash_map::Entry::Vacant(slot) = prev.entry(next) {
                    slot.insert(current);
                    queue.push_back(next);
                }
            }
        }

        vec![start]
    }

    /// Returns the number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Checks if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Checks if a node exists in the graph.
    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }
}

/// Information about a detected circular dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleInfo {
    /// All packages in the strongly connected component, sorted.
    pub members: Vec<String>,
    /// One concrete loop; the last package depends on the first.
    pub path: Vec<String>,
}

impl CycleInfo {
    /// Returns the loop formatted as `a -> b -> a`.
    pub fn cycle_path(&self) -> String {
        match self.path.first() {
            Some(first) => format!("{} -> {}", self.path.join(" -> "), first),
            None => String::new(),
        }
    }

    /// Returns the number of packages in the component.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
