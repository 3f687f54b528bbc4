//! Parser for npm package.json files.
//!
//! This module reads package manifests, both the project's own and the
//! ones inside installed package directories.

use std::fs;
use std::path::Path;

use log::debug;

use super::types::{DeclaredDependencies, Dependency, DependencyType, PackageJson};

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Errors that can occur during package.json parsing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Failed to read the file from disk.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse JSON content.
    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The package.json structure is invalid.
    #[error("Invalid package.json: {0}")]
    InvalidPackage(String),
}

/// Result type alias for parser operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a package.json file from a file path.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use depscope::parser::package_json::parse_file;
///
/// let pkg = parse_file(Path::new("package.json")).unwrap();
/// println!("Package: {:?}", pkg.name);
/// ```
pub fn parse_file(path: &Path) -> ParseResult<PackageJson> {
    let content = fs::read_to_string(path)?;
    parse_str(&content)
}

/// Parses a package.json from a string.
///
/// The top level must be a JSON object.
///
/// # Example
///
/// ```
/// use depscope::parser::package_json::parse_str;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg = parse_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
pub fn parse_str(content: &str) -> ParseResult<PackageJson> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.is_object() {
        return Err(ParseError::InvalidPackage(
            "top-level value is not an object".to_string(),
        ));
    }
    let pkg: PackageJson = serde_json::from_value(value)?;
    Ok(pkg)
}

/// Reads the manifest inside a package directory.
pub fn read_manifest(package_dir: &Path) -> ParseResult<PackageJson> {
    parse_file(&package_dir.join(MANIFEST_FILE))
}

/// Extracts all dependencies from a PackageJson into a normalized list.
///
/// Dependencies are collected from all four manifest sections and tagged
/// with the section they came from.
///
/// # Example
///
/// ```
/// use depscope::parser::package_json::{parse_str, extract_dependencies};
/// use depscope::parser::types::DependencyType;
///
/// let json = r#"{
///     "name": "my-app",
///     "dependencies": {"react": "^18.0.0"},
///     "devDependencies": {"typescript": "^5.0.0"}
/// }"#;
///
/// let pkg = parse_str(json).unwrap();
/// let deps = extract_dependencies(&pkg);
///
/// assert_eq!(deps.len(), 2);
/// assert!(deps.iter().any(|d| d.name == "react" && d.dep_type == DependencyType::Production));
/// assert!(deps.iter().any(|d| d.name == "typescript" && d.dep_type == DependencyType::Development));
/// ```
pub fn extract_dependencies(pkg: &PackageJson) -> Vec<Dependency> {
    let sections = [
        (&pkg.dependencies, DependencyType::Production),
        (&pkg.dev_dependencies, DependencyType::Development),
        (&pkg.peer_dependencies, DependencyType::Peer),
        (&pkg.optional_dependencies, DependencyType::Optional),
    ];

    let mut deps = Vec::with_capacity(pkg.dependency_count());
    for (section, dep_type) in sections {
        if let Some(entries) = section {
            for (name, version) in entries {
                deps.push(Dependency::new(name, version, dep_type));
            }
        }
    }

    deps
}

/// Reads the root project's declared dependency sets.
///
/// A missing or unparseable manifest yields four empty sets; it is
/// never an error.
pub fn read_declared_dependencies(project_root: &Path) -> DeclaredDependencies {
    match read_manifest(project_root) {
        Ok(pkg) => DeclaredDependencies::from_dependencies(&extract_dependencies(&pkg)),
        Err(e) => {
            debug!(
                "No usable project manifest at {}: {}",
                project_root.join(MANIFEST_FILE).display(),
                e
            );
            DeclaredDependencies::default()
        }
    }
}
