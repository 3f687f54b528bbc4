//! Shared types for manifest parsing.
//!
//! This module defines the data structures used to represent
//! package manifests, declared dependencies and their classification.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Represents the structure of a package.json file.
///
/// Only the fields needed for dependency analysis are captured; every
/// other key in the manifest is ignored.
///
/// # Example
///
/// ```
/// use depscope::parser::types::PackageJson;
///
/// let json = r#"{"name": "my-app", "version": "1.0.0"}"#;
/// let pkg: PackageJson = serde_json::from_str(json).unwrap();
/// assert_eq!(pkg.name, Some("my-app".to_string()));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PackageJson {
    /// The name of the package.
    pub name: Option<String>,

    /// The version of the package. Not guaranteed to be valid semver.
    pub version: Option<String>,

    /// Production dependencies required at runtime.
    pub dependencies: Option<HashMap<String, String>>,

    /// Development-only dependencies (testing, building, etc.).
    #[serde(rename = "devDependencies")]
    pub dev_dependencies: Option<HashMap<String, String>>,

    /// Peer dependencies that the host package must provide.
    #[serde(rename = "peerDependencies")]
    pub peer_dependencies: Option<HashMap<String, String>>,

    /// Optional dependencies that enhance functionality if available.
    #[serde(rename = "optionalDependencies")]
    pub optional_dependencies: Option<HashMap<String, String>>,
}

impl PackageJson {
    /// Returns true if the package has any dependencies defined.
    pub fn has_dependencies(&self) -> bool {
        self.dependency_count() > 0
    }

    /// Returns the total count of all dependencies.
    pub fn dependency_count(&self) -> usize {
        self.dependencies.as_ref().map_or(0, |d| d.len())
            + self.dev_dependencies.as_ref().map_or(0, |d| d.len())
            + self.peer_dependencies.as_ref().map_or(0, |d| d.len())
            + self.optional_dependencies.as_ref().map_or(0, |d| d.len())
    }

    /// Returns the declared version, or `"unknown"` when absent.
    pub fn version_or_unknown(&self) -> String {
        self.version
            .clone()
            .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
    }

    /// Names listed in the `dependencies` section, sorted.
    ///
    /// These are the edges followed when building dependency trees.
    pub fn runtime_dependency_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dependencies
            .as_ref()
            .map(|d| d.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Version reported for packages whose manifest has no `version`.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Classification of an installed package relative to the root project.
///
/// The first four variants mirror the manifest sections; `Transitive`
/// marks packages that no section of the root manifest declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyType {
    /// Production dependencies - required at runtime.
    Production,

    /// Development dependencies - only needed during development.
    Development,

    /// Peer dependencies - expected to be provided by the consumer.
    Peer,

    /// Optional dependencies - installation continues even if they fail.
    Optional,

    /// Installed only to satisfy another package's requirement.
    Transitive,
}

impl DependencyType {
    /// All classifications in priority order.
    pub const ALL: [DependencyType; 5] = [
        DependencyType::Production,
        DependencyType::Development,
        DependencyType::Peer,
        DependencyType::Optional,
        DependencyType::Transitive,
    ];

    /// Returns a short label for the dependency type.
    pub fn label(&self) -> &'static str {
        match self {
            DependencyType::Production => "prod",
            DependencyType::Development => "dev",
            DependencyType::Peer => "peer",
            DependencyType::Optional => "optional",
            DependencyType::Transitive => "transitive",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DependencyType::Production => "production",
            DependencyType::Development => "development",
            DependencyType::Peer => "peer",
            DependencyType::Optional => "optional",
            DependencyType::Transitive => "transitive",
        };
        write!(f, "{}", s)
    }
}

/// Represents a single declared dependency with its requirement.
#[derive(Debug, Clone)]
pub struct Dependency {
    /// The package name (e.g., "react", "@babel/core").
    pub name: String,

    /// The version specifier (e.g., "^18.0.0", "~1.2.3").
    pub version: String,

    /// The manifest section this dependency was declared in.
    pub dep_type: DependencyType,
}

impl Dependency {
    /// Creates a new Dependency instance.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        dep_type: DependencyType,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            dep_type,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.dep_type)
    }
}

/// The root project's declared dependency names, one set per section.
///
/// A name may legally appear in several sets (e.g. both peer and dev);
/// [`classify`] resolves the overlap by priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeclaredDependencies {
    pub production: BTreeSet<String>,
    pub development: BTreeSet<String>,
    pub peer: BTreeSet<String>,
    pub optional: BTreeSet<String>,
}

impl DeclaredDependencies {
    /// Builds the declared sets from a list of extracted dependencies.
    pub fn from_dependencies(deps: &[Dependency]) -> Self {
        let mut declared = Self::default();
        for dep in deps {
            let set = match dep.dep_type {
                DependencyType::Production => &mut declared.production,
                DependencyType::Development => &mut declared.development,
                DependencyType::Peer => &mut declared.peer,
                DependencyType::Optional => &mut declared.optional,
                DependencyType::Transitive => continue,
            };
            set.insert(dep.name.clone());
        }
        declared
    }

    /// Classifies `name` against these sets.
    pub fn classify(&self, name: &str) -> DependencyType {
        classify(name, self)
    }

    /// Production and development names, the roots of a project tree.
    pub fn direct_names(&self) -> BTreeSet<&str> {
        self.production
            .iter()
            .chain(self.development.iter())
            .map(String::as_str)
            .collect()
    }

    /// Returns true when no section declares anything.
    pub fn is_empty(&self) -> bool {
        self.production.is_empty()
            && self.development.is_empty()
            && self.peer.is_empty()
            && self.optional.is_empty()
    }
}

/// Classifies a package name, priority production > development > peer >
/// optional > transitive.
pub fn classify(name: &str, declared: &DeclaredDependencies) -> DependencyType {
    if declared.production.contains(name) {
        DependencyType::Production
    } else if declared.development.contains(name) {
        DependencyType::Development
    } else if declared.peer.contains(name) {
        DependencyType::Peer
    } else if declared.optional.contains(name) {
        DependencyType::Optional
    } else {
        DependencyType::Transitive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declared(prod: &[&str], dev: &[&str], peer: &[&str], optional: &[&str]) -> DeclaredDependencies {
        let set = |names: &[&str]| names.iter().map(|s| s.to_string()).collect();
        DeclaredDependencies {
            production: set(prod),
            development: set(dev),
            peer: set(peer),
            optional: set(optional),
        }
    }

    #[test]
    fn test_dependency_type_label() {
        assert_eq!(DependencyType::Production.label(), "prod");
        assert_eq!(DependencyType::Development.label(), "dev");
        assert_eq!(DependencyType::Peer.label(), "peer");
        assert_eq!(DependencyType::Optional.label(), "optional");
        assert_eq!(DependencyType::Transitive.label(), "transitive");
    }

    #[test]
    fn test_dependency_display() {
        let dep = Dependency::new("lodash", "~4.17.21", DependencyType::Development);
        assert_eq!(format!("{}", dep), "lodash@~4.17.21 (development)");
    }

    #[test]
    fn test_package_json_default() {
        let pkg = PackageJson::default();
        assert!(pkg.name.is_none());
        assert!(!pkg.has_dependencies());
        assert_eq!(pkg.dependency_count(), 0);
        assert_eq!(pkg.version_or_unknown(), "unknown");
    }

    #[test]
    fn test_runtime_dependency_names_sorted() {
        let mut pkg = PackageJson::default();
        let mut deps = HashMap::new();
        deps.insert("zod".to_string(), "^3.0.0".to_string());
        deps.insert("axios".to_string(), "^1.0.0".to_string());
        pkg.dependencies = Some(deps);

        assert_eq!(pkg.runtime_dependency_names(), vec!["axios", "zod"]);
    }

    #[test]
    fn test_classify_each_section() {
        let d = declared(&["react"], &["jest"], &["vue"], &["fsevents"]);
        assert_eq!(classify("react", &d), DependencyType::Production);
        assert_eq!(classify("jest", &d), DependencyType::Development);
        assert_eq!(classify("vue", &d), DependencyType::Peer);
        assert_eq!(classify("fsevents", &d), DependencyType::Optional);
        assert_eq!(classify("left-pad", &d), DependencyType::Transitive);
    }

    #[test]
    fn test_classify_priority_ties() {
        let d = declared(&["react"], &["react", "vue"], &["react", "vue", "x"], &["x", "y"]);
        assert_eq!(classify("react", &d), DependencyType::Production);
        assert_eq!(classify("vue", &d), DependencyType::Development);
        assert_eq!(classify("x", &d), DependencyType::Peer);
        assert_eq!(classify("y", &d), DependencyType::Optional);
    }

    #[test]
    fn test_declared_from_dependencies() {
        let deps = vec![
            Dependency::new("react", "^18", DependencyType::Production),
            Dependency::new("jest", "^29", DependencyType::Development),
            Dependency::new("react", ">=16", DependencyType::Peer),
        ];
        let d = DeclaredDependencies::from_dependencies(&deps);

        assert!(d.production.contains("react"));
        assert!(d.peer.contains("react"));
        assert!(d.development.contains("jest"));
        assert!(d.optional.is_empty());
        assert_eq!(d.direct_names().into_iter().collect::<Vec<_>>(), vec!["jest", "react"]);
    }
}
