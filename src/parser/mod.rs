//! Parser module for depscope.
//!
//! This module reads npm `package.json` manifests: the root project's
//! declared dependency sections and the manifests of installed packages.
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use depscope::parser::{read_declared_dependencies, DependencyType};
//!
//! let declared = read_declared_dependencies(Path::new("."));
//! assert_eq!(declared.classify("react"), DependencyType::Production);
//! ```

pub mod package_json;
pub mod types;

// Re-export commonly used types for convenience
pub use package_json::{
    extract_dependencies, parse_file, parse_str, read_declared_dependencies, read_manifest,
    ParseError, ParseResult, MANIFEST_FILE,
};

pub use types::{
    classify, DeclaredDependencies, Dependency, DependencyType, PackageJson, UNKNOWN_VERSION,
};
