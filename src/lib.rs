//! depscope - installed dependency analyzer for JavaScript projects
//!
//! This crate inspects what a package manager actually put on disk under
//! `node_modules` (pnpm central store or npm/yarn flat layout) and reports
//! disk usage, duplicate versions, dependency trees, circular dependencies
//! and declared dependencies that no source file imports.

pub mod analysis;
pub mod graph;
pub mod parser;
pub mod project;
pub mod store;

pub use project::{AnalysisOptions, Project};
