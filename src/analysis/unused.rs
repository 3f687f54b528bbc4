//! Unused direct dependency detection.
//!
//! A declared production or development dependency that no scanned
//! source file references is reported as a *candidate* for removal. The
//! scan is lexical, so every record needs a human look before anything
//! is uninstalled. Development tools that are driven by configuration
//! files or scripts rather than imports are never reported.

use std::path::Path;

use serde::Serialize;

use super::imports::{analyze_project_imports, ProjectImports};
use crate::parser::{DeclaredDependencies, DependencyType};
use crate::store::PackageIndex;

/// Name prefixes of development tools that are run, not imported.
pub const DEV_TOOL_PREFIXES: &[&str] = &[
    "@types/",
    "typescript",
    "ts-node",
    "tsx",
    "tsup",
    "eslint",
    "@eslint/",
    "@typescript-eslint/",
    "prettier",
    "stylelint",
    "jest",
    "@jest/",
    "ts-jest",
    "babel-jest",
    "vitest",
    "@vitest/",
    "mocha",
    "nyc",
    "c8",
    "karma",
    "cypress",
    "playwright",
    "@playwright/",
    "@testing-library/",
    "webpack",
    "rollup",
    "@rollup/",
    "vite",
    "@vitejs/",
    "esbuild",
    "parcel",
    "@babel/",
    "babel-",
    "postcss",
    "autoprefixer",
    "tailwindcss",
    "sass",
    "nodemon",
    "husky",
    "lint-staged",
    "@commitlint/",
    "commitlint",
    "concurrently",
    "cross-env",
    "rimraf",
    "npm-run-all",
    "turbo",
    "lerna",
    "@changesets/",
];

/// A declared dependency with no import found in the project sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnusedDependency {
    pub name: String,
    pub version: String,
    pub size: u64,
    /// Either production or development.
    pub classification: DependencyType,
}

/// Returns true if `name` is a conventionally import-free dev tool.
pub fn is_dev_tool(name: &str) -> bool {
    DEV_TOOL_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// Cross-references declared dependencies against scanned imports.
///
/// Only installed packages are reported. Peer and optional dependencies
/// are never evaluated. Results are sorted largest first.
pub fn find_unused_with_imports(
    index: &PackageIndex,
    declared: &DeclaredDependencies,
    imports: &ProjectImports,
) -> Vec<UnusedDependency> {
    let production = declared
        .production
        .iter()
        .map(|name| (name, DependencyType::Production));
    let development = declared
        .development
        .iter()
        .filter(|name| !declared.production.contains(*name) && !is_dev_tool(name))
        .map(|name| (name, DependencyType::Development));

    let mut unused: Vec<UnusedDependency> = production
        .chain(development)
        .filter(|(name, _)| !imports.is_used(name))
        .filter_map(|(name, classification)| {
            index.get(name).map(|pkg| UnusedDependency {
                name: name.clone(),
                version: pkg.version.clone(),
                size: pkg.size,
                classification,
            })
        })
        .collect();

    unused.sort_by(|a, b| b.size.cmp(&a.size));
    unused
}

/// Scans the sources under `project_root` and reports unused direct
/// dependencies.
pub fn find_unused(
    project_root: &Path,
    index: &PackageIndex,
    declared: &DeclaredDependencies,
) -> Vec<UnusedDependency> {
    let imports = analyze_project_imports(project_root);
    find_unused_with_imports(index, declared, &imports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::imports::extract_imports;
    use crate::store::package::test_package;

    fn set(names: &[&str]) -> std::collections::BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn imports_of(code: &str) -> ProjectImports {
        let mut imports = ProjectImports::new();
        imports.add_file_imports(Path::new("src/index.js"), &extract_imports(code));
        imports
    }

    #[test]
    fn test_is_dev_tool() {
        assert!(is_dev_tool("eslint"));
        assert!(is_dev_tool("eslint-plugin-x"));
        assert!(is_dev_tool("@types/node"));
        assert!(is_dev_tool("@babel/preset-env"));
        assert!(!is_dev_tool("react"));
        assert!(!is_dev_tool("lodash"));
    }

    #[test]
    fn test_reports_unimported_production() {
        let index = PackageIndex::from_packages(vec![
            test_package("left-pad", "1.3.0", 100, &[]),
            test_package("react", "18.2.0", 900, &[]),
        ]);
        let declared = DeclaredDependencies {
            production: set(&["left-pad", "react"]),
            ..Default::default()
        };

        let used = imports_of("import x from 'left-pad';\nimport React from 'react';");
        assert!(find_unused_with_imports(&index, &declared, &used).is_empty());

        let only_react = imports_of("import React from 'react';");
        let unused = find_unused_with_imports(&index, &declared, &only_react);
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].name, "left-pad");
        assert_eq!(unused[0].version, "1.3.0");
        assert_eq!(unused[0].classification, DependencyType::Production);
    }

    #[test]
    fn test_dev_tools_never_reported() {
        let index = PackageIndex::from_packages(vec![
            test_package("eslint", "9.0.0", 100, &[]),
            test_package("eslint-plugin-x", "1.0.0", 100, &[]),
            test_package("dotenv", "16.0.0", 10, &[]),
        ]);
        let declared = DeclaredDependencies {
            development: set(&["eslint", "eslint-plugin-x", "dotenv"]),
            ..Default::default()
        };

        let unused = find_unused_with_imports(&index, &declared, &ProjectImports::new());
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].name, "dotenv");
        assert_eq!(unused[0].classification, DependencyType::Development);
    }

    #[test]
    fn test_peer_optional_and_missing_ignored() {
        let index = PackageIndex::from_packages(vec![
            test_package("peer-lib", "1.0.0", 100, &[]),
            test_package("opt-lib", "1.0.0", 100, &[]),
        ]);
        let declared = DeclaredDependencies {
            production: set(&["not-installed"]),
            peer: set(&["peer-lib"]),
            optional: set(&["opt-lib"]),
            ..Default::default()
        };

        assert!(find_unused_with_imports(&index, &declared, &ProjectImports::new()).is_empty());
    }

    #[test]
    fn test_sorted_by_size_and_single_record_per_name() {
        let index = PackageIndex::from_packages(vec![
            test_package("small", "1.0.0", 10, &[]),
            test_package("big", "1.0.0", 1000, &[]),
            test_package("both", "1.0.0", 500, &[]),
        ]);
        let declared = DeclaredDependencies {
            production: set(&["small", "big", "both"]),
            development: set(&["both"]),
            ..Default::default()
        };

        let unused = find_unused_with_imports(&index, &declared, &ProjectImports::new());
        let names: Vec<&str> = unused.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["big", "both", "small"]);
        assert_eq!(unused[1].classification, DependencyType::Production);
    }

    #[test]
    fn test_subpath_import_counts_as_use() {
        let index = PackageIndex::from_packages(vec![test_package("lodash", "4.17.21", 10, &[])]);
        let declared = DeclaredDependencies {
            production: set(&["lodash"]),
            ..Default::default()
        };

        let imports = imports_of("const fp = require('lodash/fp');");
        assert!(find_unused_with_imports(&index, &declared, &imports).is_empty());
    }
}
