//! Lexical import scanning for JavaScript/TypeScript sources.
//!
//! Source files are matched against a handful of regular expressions for
//! `import`, `export ... from`, `require()` and `import()` forms. This is
//! not a parser: specifiers built at runtime are invisible, and matches
//! inside comments or strings are counted. Treat the result as
//! best-effort evidence of use.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;
use walkdir::{DirEntry, WalkDir};

/// File extensions treated as source code.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "vue", "svelte", "astro",
];

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "coverage",
    ".next",
    ".nuxt",
    ".output",
    ".svelte-kit",
    ".turbo",
    ".cache",
    ".vercel",
];

// The clause between the keyword and `from` is a default binding, a
// namespace or a brace list, so an earlier `export { a }` cannot reach
// into the next statement.
static FROM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r#"\b(import|export)\b\s*(?:type\b\s*)?(?:[\w$]+\s*,?\s*)?"#,
        r#"(?:\*\s*(?:as\s+[\w$]+\s*)?|\{[^{}]*\}\s*)?"#,
        r#"\bfrom\s*['"]([^'"\n]+)['"]"#,
    ))
    .unwrap()
});
static SIDE_EFFECT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*['"]([^'"\n]+)['"]"#).unwrap());
static REQUIRE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire(?:\.resolve)?\s*\(\s*['"`]([^'"`\n]+)['"`]\s*\)"#).unwrap()
});
static DYN_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*\(\s*['"`]([^'"`\n]+)['"`]\s*\)"#).unwrap());

/// The syntactic form an import was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportKind {
    /// `import x from 'module'`
    ES6,
    /// `export { x } from 'module'`
    ReExport,
    /// `import 'module'`
    SideEffect,
    /// `require('module')`
    CommonJS,
    /// `import('module')`
    DynamicImport,
}

/// A single import reference found in a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// The specifier as written (e.g., "react", "./utils", "@scope/pkg/sub")
    pub source: String,
    pub kind: ImportKind,
    /// Line number in the source file (1-indexed)
    pub line: usize,
}

impl Import {
    /// Returns true if this import is from a package (not a relative/absolute path).
    pub fn is_package_import(&self) -> bool {
        is_package_specifier(&self.source)
    }

    /// Returns the package name for package imports.
    pub fn package_name(&self) -> Option<&str> {
        package_name(&self.source)
    }
}

fn is_package_specifier(specifier: &str) -> bool {
    !specifier.is_empty() && !specifier.starts_with('.') && !specifier.starts_with('/')
}

/// Normalizes an import specifier to the package it refers to.
///
/// Scoped specifiers keep `@scope/name`; others keep the first path
/// segment. Relative and absolute paths yield `None`.
///
/// # Example
///
/// ```
/// use depscope::analysis::package_name;
///
/// assert_eq!(package_name("lodash/fp"), Some("lodash"));
/// assert_eq!(package_name("@babel/core/lib/index"), Some("@babel/core"));
/// assert_eq!(package_name("./local"), None);
/// ```
pub fn package_name(specifier: &str) -> Option<&str> {
    if !is_package_specifier(specifier) {
        return None;
    }

    if specifier.starts_with('@') {
        if let Some(slash) = specifier.find('/') {
            let end = specifier[slash + 1..]
                .find('/')
                .map_or(specifier.len(), |i| slash + 1 + i);
            return Some(&specifier[..end]);
        }
    }

    match specifier.find('/') {
        Some(idx) => Some(&specifier[..idx]),
        None => Some(specifier),
    }
}

/// Extracts every import reference from source text.
///
/// Results are ordered by position in the file.
pub fn extract_imports(source: &str) -> Vec<Import> {
    let mut found: Vec<(usize, String, ImportKind)> = Vec::new();

    for caps in FROM_RE.captures_iter(source) {
        let kind = if &caps[1] == "export" {
            ImportKind::ReExport
        } else {
            ImportKind::ES6
        };
        if let Some(m) = caps.get(2) {
            found.push((m.start(), m.as_str().to_string(), kind));
        }
    }
    let patterns: [(&Lazy<Regex>, ImportKind); 3] = [
        (&SIDE_EFFECT_RE, ImportKind::SideEffect),
        (&REQUIRE_RE, ImportKind::CommonJS),
        (&DYN_IMPORT_RE, ImportKind::DynamicImport),
    ];
    for (re, kind) in patterns {
        for caps in re.captures_iter(source) {
            if let Some(m) = caps.get(1) {
                found.push((m.start(), m.as_str().to_string(), kind));
            }
        }
    }

    found.sort_by_key(|(offset, _, _)| *offset);
    found.dedup_by_key(|(offset, _, _)| *offset);

    let line_starts: Vec<usize> = std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect();

    found
        .into_iter()
        .map(|(offset, source, kind)| Import {
            line: line_starts.partition_point(|&start| start <= offset),
            source,
            kind,
        })
        .collect()
}

/// Package references collected across a project.
#[derive(Debug, Clone, Default)]
pub struct ProjectImports {
    /// Source files that were read.
    pub files_scanned: usize,
    /// Package name -> files importing it.
    pub package_usage: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl ProjectImports {
    /// Create a new empty ProjectImports.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the package imports of one file.
    pub fn add_file_imports(&mut self, file: &Path, imports: &[Import]) {
        for import in imports {
            if let Some(name) = import.package_name() {
                self.package_usage
                    .entry(name.to_string())
                    .or_default()
                    .insert(file.to_path_buf());
            }
        }
    }

    /// Returns true if any scanned file references `name`.
    pub fn is_used(&self, name: &str) -> bool {
        self.package_usage.contains_key(name)
    }

    /// All referenced package names.
    pub fn package_names(&self) -> BTreeSet<&str> {
        self.package_usage.keys().map(String::as_str).collect()
    }
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name))
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Walks `root` and collects package imports from every source file.
///
/// Unreadable files and directories are skipped.
pub fn analyze_project_imports(root: &Path) -> ProjectImports {
    let mut project = ProjectImports::new();

    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                trace!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file() || !has_source_extension(path) {
            continue;
        }

        match fs::read(path) {
            Ok(bytes) => {
                let source = String::from_utf8_lossy(&bytes);
                let imports = extract_imports(&source);
                project.add_file_imports(path, &imports);
                project.files_scanned += 1;
            }
            Err(e) => trace!("Skipping {}: {}", path.display(), e),
        }
    }

    debug!(
        "Scanned {} source files, {} packages referenced",
        project.files_scanned,
        project.package_usage.len()
    );
    project
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sources(code: &str) -> Vec<String> {
        extract_imports(code).into_iter().map(|i| i.source).collect()
    }

    #[test]
    fn test_es6_imports() {
        let code = r#"
import React from 'react';
import { useState, useEffect } from "react";
import * as path from 'node:path';
import type { Foo } from "./types";
"#;
        assert_eq!(sources(code), vec!["react", "react", "node:path", "./types"]);
    }

    #[test]
    fn test_multiline_named_import() {
        let code = "import {\n  a,\n  b,\n} from 'lib-multi';\n";
        let imports = extract_imports(code);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].source, "lib-multi");
        assert_eq!(imports[0].kind, ImportKind::ES6);
        assert_eq!(imports[0].line, 4);
    }

    #[test]
    fn test_export_declaration_does_not_swallow_import() {
        let code = "export function f() { return 1 }\nimport a from 'after-export';\n";
        let imports = extract_imports(code);
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].kind, ImportKind::ES6);
        assert_eq!(imports[0].line, 2);
    }

    #[test]
    fn test_local_export_list_does_not_swallow_import() {
        let code = "const a = 1;\nexport { a }\nimport b from 'pkg-b';\nexport * as ns from 'pkg-ns';\n";
        let imports = extract_imports(code);
        let found: Vec<(&str, ImportKind, usize)> = imports
            .iter()
            .map(|i| (i.source.as_str(), i.kind, i.line))
            .collect();
        assert_eq!(
            found,
            vec![
                ("pkg-b", ImportKind::ES6, 3),
                ("pkg-ns", ImportKind::ReExport, 4),
            ]
        );
    }

    #[test]
    fn test_default_with_named_import() {
        let code = "import React, { useState } from 'react';\nimport type Config from 'cfg-types';\n";
        let imports = extract_imports(code);
        assert_eq!(imports.len(), 2);
        assert!(imports.iter().all(|i| i.kind == ImportKind::ES6));
        assert_eq!(imports[1].source, "cfg-types");
    }

    #[test]
    fn test_side_effect_and_reexport() {
        let code = "import 'polyfill';\nexport { x } from '@scope/re';\nexport * from 'star-pkg';\n";
        let imports = extract_imports(code);
        let kinds: Vec<(&str, ImportKind, usize)> = imports
            .iter()
            .map(|i| (i.source.as_str(), i.kind, i.line))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("polyfill", ImportKind::SideEffect, 1),
                ("@scope/re", ImportKind::ReExport, 2),
                ("star-pkg", ImportKind::ReExport, 3),
            ]
        );
    }

    #[test]
    fn test_require_and_dynamic_import() {
        let code = r#"
const fs = require('fs-extra');
const { a } = require ( "cjs-lib" );
const p = require.resolve('resolved-lib');
const lazy = await import('lazy-lib');
const computed = require(name);
"#;
        let imports = extract_imports(code);
        let found: Vec<(&str, ImportKind)> =
            imports.iter().map(|i| (i.source.as_str(), i.kind)).collect();
        assert_eq!(
            found,
            vec![
                ("fs-extra", ImportKind::CommonJS),
                ("cjs-lib", ImportKind::CommonJS),
                ("resolved-lib", ImportKind::CommonJS),
                ("lazy-lib", ImportKind::DynamicImport),
            ]
        );
    }

    #[test]
    fn test_package_name_normalization() {
        assert_eq!(package_name("lodash"), Some("lodash"));
        assert_eq!(package_name("lodash/fp"), Some("lodash"));
        assert_eq!(package_name("@babel/core"), Some("@babel/core"));
        assert_eq!(package_name("@babel/core/lib/x"), Some("@babel/core"));
        assert_eq!(package_name("@scopeonly"), Some("@scopeonly"));
        assert_eq!(package_name("./utils"), None);
        assert_eq!(package_name("../up"), None);
        assert_eq!(package_name("/abs/path"), None);
        assert_eq!(package_name(""), None);
    }

    #[test]
    fn test_import_helpers() {
        let import = Import {
            source: "@scope/pkg/deep".to_string(),
            kind: ImportKind::ES6,
            line: 1,
        };
        assert!(import.is_package_import());
        assert_eq!(import.package_name(), Some("@scope/pkg"));
    }

    #[test]
    fn test_analyze_project_imports_excludes_dirs() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::create_dir_all(root.join("dist")).unwrap();

        fs::write(root.join("src/index.ts"), "import x from 'left-pad';\nimport './local';").unwrap();
        fs::write(root.join("src/nested/a.jsx"), "const y = require('lodash/fp');").unwrap();
        fs::write(root.join("src/readme.md"), "import z from 'not-code';").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "require('hidden-in-store')").unwrap();
        fs::write(root.join("dist/bundle.js"), "require('hidden-in-dist')").unwrap();

        let project = analyze_project_imports(root);
        assert_eq!(project.files_scanned, 2);
        assert_eq!(
            project.package_names().into_iter().collect::<Vec<_>>(),
            vec!["left-pad", "lodash"]
        );
        assert!(!project.is_used("hidden-in-store"));
        assert!(!project.is_used("not-code"));
    }
}
