//! Entry point tying layout detection, discovery and the analyses
//! together for one project.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::analysis::{find_duplicates, find_unused, DuplicateGroup, SizeReport, UnusedDependency};
use crate::graph::{build_tree, CycleInfo, DependencyGraph, TreeNode};
use crate::parser::{read_declared_dependencies, DeclaredDependencies};
use crate::store::{
    dir_size, discover_packages, DiscoveryError, DiscoveryProgress, DiscoveryResult, Layout,
    NoProgress, PackageIndex, STORE_DIR,
};

/// Default tree depth limit.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Default number of entries shown in truncated reports.
pub const DEFAULT_TOP_N: usize = 10;

/// Limits on how much of the computed model is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    /// Deepest tree level kept (root = 0).
    pub max_depth: usize,
    /// Entries kept in size and duplicate listings.
    pub top_n: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// A project whose installed packages have been discovered.
///
/// Opening a project performs one fresh discovery pass; the analyses
/// then run read-only over the resulting index.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    layout: Layout,
    declared: DeclaredDependencies,
    index: PackageIndex,
}

impl Project {
    /// Discovers the project at `root`.
    pub fn open(root: &Path) -> DiscoveryResult<Self> {
        Self::open_with_progress(root, &NoProgress)
    }

    /// Discovers the project at `root`, reporting progress.
    ///
    /// # Errors
    ///
    /// Fails if `root` cannot be resolved or has no `node_modules`.
    pub fn open_with_progress(
        root: &Path,
        progress: &dyn DiscoveryProgress,
    ) -> DiscoveryResult<Self> {
        let root = fs::canonicalize(root).map_err(|source| DiscoveryError::InvalidRoot {
            path: root.to_path_buf(),
            source,
        })?;
        let declared = read_declared_dependencies(&root);
        let layout = Layout::detect(&root);
        let packages = discover_packages(&root, &declared, layout, progress)?;
        let index = PackageIndex::from_packages(packages);

        info!(
            "Indexed {} packages ({} names) in {} using {} layout",
            index.len(),
            index.name_count(),
            root.display(),
            layout
        );

        Ok(Self {
            root,
            layout,
            declared,
            index,
        })
    }

    /// Absolute project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn declared(&self) -> &DeclaredDependencies {
        &self.declared
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    /// Disk footprint summary with the `top_n` largest packages.
    pub fn size_report(&self, top_n: usize) -> SizeReport {
        let store_size = dir_size(&self.root.join(STORE_DIR));
        SizeReport::new(&self.index, store_size, top_n)
    }

    /// Names installed at more than one version, largest total first.
    pub fn duplicates(&self) -> Vec<DuplicateGroup> {
        find_duplicates(&self.index)
    }

    /// Declared-edge graph over the installed packages.
    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_index(&self.index)
    }

    /// Dependency trees rooted at `start`, or at every direct production
    /// and development dependency when `start` is `None`.
    pub fn tree(&self, start: Option<&str>, max_depth: usize) -> Vec<TreeNode> {
        build_tree(&self.graph(), &self.declared, start, max_depth)
    }

    /// Circular dependencies among installed packages.
    pub fn cycles(&self) -> Vec<CycleInfo> {
        self.graph().detect_cycles()
    }

    /// Direct dependencies with no import found in the project sources.
    pub fn unused(&self) -> Vec<UnusedDependency> {
        find_unused(&self.root, &self.index, &self.declared)
    }
}
