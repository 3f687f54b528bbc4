//! Installed package model and the name-keyed index over it.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::parser::DependencyType;

/// A package physically installed in the package store.
///
/// Identity is the `(name, version)` pair; the same name may be installed
/// at several versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    /// Package name, possibly scoped (`@scope/name`).
    pub name: String,
    /// Installed version, `"unknown"` when the manifest has none.
    pub version: String,
    /// Bytes of all files inside the installed directory.
    pub size: u64,
    /// Relationship to the root project.
    pub classification: DependencyType,
    /// Installed directory.
    pub path: PathBuf,
    /// Names from the package's own `dependencies` section.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl Package {
    /// Returns the `(name, version)` identity.
    pub fn key(&self) -> (&str, &str) {
        (&self.name, &self.version)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.classification)
    }
}

/// Deduplicated set of discovered packages with lookup by name.
///
/// Packages keep discovery order. When several versions share a name,
/// name lookup resolves to the first one discovered, which for the flat
/// layout is the hoisted (shallowest) copy.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: Vec<Package>,
    by_name: HashMap<String, usize>,
}

impl PackageIndex {
    /// Builds an index, dropping repeated `(name, version)` pairs.
    ///
    /// The first occurrence of each identity wins.
    pub fn from_packages(packages: Vec<Package>) -> Self {
        let mut seen: HashSet<(String, String)> = HashSet::with_capacity(packages.len());
        let mut kept = Vec::with_capacity(packages.len());
        let mut by_name = HashMap::with_capacity(packages.len());

        for pkg in packages {
            if !seen.insert((pkg.name.clone(), pkg.version.clone())) {
                continue;
            }
            by_name.entry(pkg.name.clone()).or_insert(kept.len());
            kept.push(pkg);
        }

        Self {
            packages: kept,
            by_name,
        }
    }

    /// Returns the package a bare name resolves to.
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.by_name.get(name).map(|&i| &self.packages[i])
    }

    /// Returns true if any version of `name` is installed.
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// All packages in discovery order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Package> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Number of distinct package names.
    pub fn name_count(&self) -> usize {
        self.by_name.len()
    }

    /// Sum of all package sizes.
    pub fn total_size(&self) -> u64 {
        self.packages.iter().map(|p| p.size).sum()
    }
}

impl<'a> IntoIterator for &'a PackageIndex {
    type Item = &'a Package;
    type IntoIter = std::slice::Iter<'a, Package>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

#[cfg(test)]
pub(crate) fn test_package(name: &str, version: &str, size: u64, deps: &[&str]) -> Package {
    Package {
        name: name.to_string(),
        version: version.to_string(),
        size,
        classification: DependencyType::Transitive,
        path: PathBuf::from("node_modules").join(name),
        dependencies: deps.iter().map(|d| d.to_string()).collect(),
    }
}
