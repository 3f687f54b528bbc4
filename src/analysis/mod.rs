//! Analyses over the discovered package index.
//!
//! # Features
//!
//! - Disk footprint summary per classification and largest packages
//! - Duplicate-version detection with wasted-space estimates
//! - Lexical scanning of `import`/`require()` references in project sources
//! - Unused direct dependency candidates
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use depscope::analysis::{find_duplicates, find_unused};
//!
//! for group in find_duplicates(&index) {
//!     println!("{}: {} versions", group.name, group.versions.len());
//! }
//! let unused = find_unused(Path::new("."), &index, &declared);
//! ```

pub mod duplicates;
pub mod imports;
pub mod size_report;
pub mod unused;

// Re-export main types for convenience
pub use duplicates::{find_duplicates, total_wasted, DuplicateGroup, InstalledVersion};
pub use imports::{
    analyze_project_imports, extract_imports, package_name, Import, ImportKind, ProjectImports,
};
pub use size_report::{SizeReport, TypeSummary};
pub use unused::{find_unused, find_unused_with_imports, is_dev_tool, UnusedDependency};
