//! Graph module for dependency relationship modeling.
//!
//! This module provides the [`DependencyGraph`] built over installed
//! packages and the [`TreeBuilder`] that expands it into finite trees.
//!
//! # Example
//!
//! ```rust
//! use depscope::graph::{DependencyGraph, DependencyNode, TreeBuilder};
//! use depscope::parser::DependencyType;
//!
//! let mut graph = DependencyGraph::new();
//! graph.add_node(DependencyNode::new("react-dom", "18.2.0", DependencyType::Production, 4096));
//! graph.add_node(DependencyNode::new("react", "18.2.0", DependencyType::Production, 1024));
//! graph.add_edge("react-dom", "react");
//!
//! let tree = TreeBuilder::new(&graph, 3).build("react-dom").unwrap();
//! assert_eq!(tree.children[0].name, "react");
//! ```

mod dependency_graph;
mod tree;

pub use dependency_graph::{CycleInfo, DependencyGraph, DependencyNode};
pub use tree::{build_tree, FlattenedNode, TreeBuilder, TreeNode};
