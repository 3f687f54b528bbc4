//! Dependency tree construction.
//!
//! Trees are expanded from the [`DependencyGraph`] with a depth limit and
//! a visited set scoped to the current root-to-node path. A package that
//! is its own ancestor is cut, while the same package reached through
//! sibling branches (a diamond) appears under each of them.

use std::collections::HashSet;

use serde::Serialize;

use super::dependency_graph::DependencyGraph;
use crate::parser::{DeclaredDependencies, DependencyType};

/// A node in a dependency tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
    /// Installed size in bytes
    pub size: u64,
    /// Relationship to the root project
    pub dep_type: DependencyType,
    /// Depth in the tree (0 = root)
    pub depth: usize,
    /// Child dependencies, largest first
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Check if this node has children
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }

    /// Length in nodes of the longest root-to-leaf path.
    pub fn height(&self) -> usize {
        1 + self.children.iter().map(TreeNode::height).max().unwrap_or(0)
    }

    /// Flatten the tree into pre-order rows for line-based output.
    pub fn flatten(&self) -> Vec<FlattenedNode> {
        let mut result = Vec::new();
        self.flatten_recursive(&mut result, true);
        result
    }

    fn flatten_recursive(&self, result: &mut Vec<FlattenedNode>, is_last: bool) {
        result.push(FlattenedNode {
            name: self.name.clone(),
            version: self.version.clone(),
            size: self.size,
            depth: self.depth,
            has_children: self.has_children(),
            is_last_child: is_last,
        });

        let child_count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            child.flatten_recursive(result, i == child_count - 1);
        }
    }
}

/// A flattened representation of a tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedNode {
    pub name: String,
    pub version: String,
    pub size: u64,
    pub depth: usize,
    pub has_children: bool,
    /// Whether this node is the last among its siblings
    pub is_last_child: bool,
}

/// Builds dependency trees from a [`DependencyGraph`].
#[derive(Debug, Clone, Copy)]
pub struct TreeBuilder<'a> {
    graph: &'a DependencyGraph,
    max_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    /// Creates a builder; `max_depth` is the deepest level kept (root = 0).
    pub fn new(graph: &'a DependencyGraph, max_depth: usize) -> Self {
        Self { graph, max_depth }
    }

    /// Builds the tree rooted at `name`.
    ///
    /// Returns `None` if no installed package has that name.
    pub fn build(&self, name: &str) -> Option<TreeNode> {
        self.build_node(name, 0, &HashSet::new())
    }

    /// Builds one tree per direct production and development dependency,
    /// largest first. Declared names that are not installed are skipped.
    pub fn build_project(&self, declared: &DeclaredDependencies) -> Vec<TreeNode> {
        let mut roots: Vec<TreeNode> = declared
            .direct_names()
            .into_iter()
            .filter_map(|name| self.build(name))
            .collect();
        roots.sort_by(|a, b| b.size.cmp(&a.size));
        roots
    }

    fn build_node(&self, name: &str, depth: usize, visited: &HashSet<String>) -> Option<TreeNode> {
        if depth > self.max_depth || visited.contains(name) {
            return None;
        }
        let node = self.graph.get_node(name)?;

        let mut path = visited.clone();
        path.insert(name.to_string());

        let mut children: Vec<TreeNode> = self
            .graph
            .get_dependencies(name)
            .into_iter()
            .filter_map(|child| self.build_node(&child.name, depth + 1, &path))
            .collect();
        children.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name)));

        Some(TreeNode {
            name: node.name.clone(),
            version: node.version.clone(),
            size: node.size,
            dep_type: node.dep_type,
            depth,
            children,
        })
    }
}

/// Builds the requested dependency forest.
///
/// With `start`, the result holds at most one tree rooted there (empty
/// when the package is not installed). Without it, every direct
/// production and development dependency becomes a root.
pub fn build_tree(
    graph: &DependencyGraph,
    declared: &DeclaredDependencies,
    start: Option<&str>,
    max_depth: usize,
) -> Vec<TreeNode> {
    let builder = TreeBuilder::new(graph, max_depth);
    match start {
        Some(name) => builder.build(name).into_iter().collect(),
        None => builder.build_project(declared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::package::test_package;
    use crate::store::PackageIndex;

    fn graph(packages: &[(&str, u64, &[&str])]) -> DependencyGraph {
        let index = PackageIndex::from_packages(
            packages
                .iter()
                .map(|(name, size, deps)| test_package(name, "1.0.0", *size, deps))
                .collect(),
        );
        DependencyGraph::from_index(&index)
    }

    fn names_on_paths(node: &TreeNode, path: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
        path.push(node.name.clone());
        if node.children.is_empty() {
            out.push(path.clone());
        }
        for child in &node.children {
            names_on_paths(child, path, out);
        }
        path.pop();
    }

    #[test]
    fn test_mutual_cycle_is_cut() {
        let g = graph(&[("pkgA", 10, &["pkgB"]), ("pkgB", 10, &["pkgA"])]);

        let forest = build_tree(&g, &DeclaredDependencies::default(), Some("pkgA"), 5);
        assert_eq!(forest.len(), 1);
        let root = &forest[0];
        assert_eq!(root.name, "pkgA");
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].name, "pkgB");
        assert!(root.children[0].children.is_empty());
    }

    #[test]
    fn test_self_dependency_is_cut() {
        let g = graph(&[("a", 10, &["a"])]);
        let root = TreeBuilder::new(&g, 5).build("a").unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_diamond_appears_in_each_branch() {
        let g = graph(&[
            ("app", 1, &["left", "right"]),
            ("left", 20, &["shared"]),
            ("right", 10, &["shared"]),
            ("shared", 5, &[]),
        ]);

        let root = TreeBuilder::new(&g, 5).build("app").unwrap();
        assert_eq!(root.children[0].name, "left");
        assert_eq!(root.children[1].name, "right");
        assert_eq!(root.children[0].children[0].name, "shared");
        assert_eq!(root.children[1].children[0].name, "shared");
        assert_eq!(root.node_count(), 5);
    }

    #[test]
    fn test_depth_limit_omits_nodes_past_cutoff() {
        let g = graph(&[("a", 1, &["b"]), ("b", 1, &["c"]), ("c", 1, &["d"]), ("d", 1, &[])]);

        let root = TreeBuilder::new(&g, 2).build("a").unwrap();
        assert_eq!(root.height(), 3);
        assert_eq!(root.children[0].children[0].name, "c");
        assert!(root.children[0].children[0].children.is_empty());

        let only_root = TreeBuilder::new(&g, 0).build("a").unwrap();
        assert_eq!(only_root.node_count(), 1);
    }

    #[test]
    fn test_children_sorted_by_size() {
        let g = graph(&[
            ("app", 1, &["small", "big", "mid"]),
            ("small", 1, &[]),
            ("big", 100, &[]),
            ("mid", 50, &[]),
        ]);

        let root = TreeBuilder::new(&g, 3).build("app").unwrap();
        let order: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["big", "mid", "small"]);
    }

    #[test]
    fn test_missing_start_is_empty() {
        let g = graph(&[("a", 1, &[])]);
        assert!(build_tree(&g, &DeclaredDependencies::default(), Some("zzz"), 3).is_empty());
    }

    #[test]
    fn test_project_roots() {
        let g = graph(&[
            ("react", 100, &["loose-envify"]),
            ("loose-envify", 5, &[]),
            ("jest", 500, &[]),
            ("peer-only", 1000, &[]),
        ]);
        let declared = DeclaredDependencies {
            production: ["react", "not-installed"].iter().map(|s| s.to_string()).collect(),
            development: ["jest"].iter().map(|s| s.to_string()).collect(),
            peer: ["peer-only"].iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        };

        let forest = build_tree(&g, &declared, None, 3);
        let roots: Vec<&str> = forest.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(roots, vec!["jest", "react"]);
        assert_eq!(forest[1].children[0].name, "loose-envify");
    }

    #[test]
    fn test_dense_cycles_stay_finite() {
        let names = ["a", "b", "c", "d", "e"];
        let g = graph(&names.iter().map(|n| (*n, 1u64, &names[..])).collect::<Vec<_>>());
        let max_depth = 3;

        let root = TreeBuilder::new(&g, max_depth).build("a").unwrap();
        let mut paths = Vec::new();
        names_on_paths(&root, &mut Vec::new(), &mut paths);

        for path in paths {
            assert!(path.len() <= max_depth + 1);
            let unique: HashSet<&String> = path.iter().collect();
            assert_eq!(unique.len(), path.len(), "repeated name on {:?}", path);
        }
    }

    #[test]
    fn test_flatten() {
        let g = graph(&[("a", 3, &["b", "c"]), ("b", 2, &[]), ("c", 1, &[])]);
        let rows = TreeBuilder::new(&g, 3).build("a").unwrap().flatten();

        let summary: Vec<(&str, usize, bool)> = rows
            .iter()
            .map(|r| (r.name.as_str(), r.depth, r.is_last_child))
            .collect();
        assert_eq!(summary, vec![("a", 0, true), ("b", 1, false), ("c", 1, true)]);
    }
}
