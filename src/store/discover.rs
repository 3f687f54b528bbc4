//! Package discovery over the supported store layouts.
//!
//! Each layout is a [`PackageDiscoverer`] strategy. A strategy only has to
//! locate candidate package directories; deduplication, size measurement
//! and classification are shared, so every strategy yields the same kind
//! of deduplicated [`Package`] list.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, trace};
use rayon::prelude::*;

use super::layout::{Layout, StoreKind, CENTRAL_STORE_DIR, STORE_DIR};
use super::package::Package;
use super::progress::DiscoveryProgress;
use super::size::dir_size;
use crate::parser::{read_manifest, DeclaredDependencies};

/// Nesting cap for the flat-layout walk.
pub const MAX_NESTING_DEPTH: usize = 10;

/// Errors that abort discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The installed-package root does not exist.
    #[error("No {} directory found at {}", STORE_DIR, path.display())]
    StoreNotFound { path: PathBuf },

    /// The project root could not be resolved.
    #[error("Cannot resolve project root {}: {source}", path.display())]
    InvalidRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// A located package directory whose manifest was readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub version: String,
    pub dir: PathBuf,
    pub dependencies: Vec<String>,
}

/// A strategy for finding installed packages in one store layout.
pub trait PackageDiscoverer: Send + Sync {
    /// Finds candidate package directories under `store`.
    ///
    /// Directories without a readable manifest are not candidates.
    fn locate(&self, store: &Path) -> Vec<Candidate>;

    /// Locates, deduplicates, measures and classifies packages.
    fn discover(
        &self,
        store: &Path,
        declared: &DeclaredDependencies,
        progress: &dyn DiscoveryProgress,
    ) -> Vec<Package> {
        let candidates = dedup_candidates(self.locate(store));
        measure(candidates, declared, progress)
    }
}

/// Returns the strategy for a store arrangement.
pub fn discoverer_for(kind: StoreKind) -> Box<dyn PackageDiscoverer> {
    match kind {
        StoreKind::CentralStore => Box::new(CentralStore),
        StoreKind::Flat => Box::new(FlatStore::default()),
    }
}

/// Discovers every package installed for the project at `root`.
///
/// # Errors
///
/// Returns [`DiscoveryError::StoreNotFound`] when `root/node_modules` does
/// not exist. Every other problem only excludes the affected entry.
pub fn discover_packages(
    root: &Path,
    declared: &DeclaredDependencies,
    layout: Layout,
    progress: &dyn DiscoveryProgress,
) -> DiscoveryResult<Vec<Package>> {
    let store = root.join(STORE_DIR);
    if !store.is_dir() {
        return Err(DiscoveryError::StoreNotFound { path: store });
    }

    let packages = discoverer_for(layout.store_kind()).discover(&store, declared, progress);
    debug!(
        "Discovered {} packages in {} ({} layout)",
        packages.len(),
        store.display(),
        layout
    );
    Ok(packages)
}

/// npm/yarn style store: packages are direct children of `node_modules`,
/// with nested `node_modules` holding conflicting versions.
#[derive(Debug, Clone)]
pub struct FlatStore {
    max_depth: usize,
}

impl Default for FlatStore {
    fn default() -> Self {
        Self {
            max_depth: MAX_NESTING_DEPTH,
        }
    }
}

impl FlatStore {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Walks one `node_modules` level, then recurses into nested stores.
    ///
    /// All packages of a level are recorded before any nested store is
    /// visited, so hoisted copies are discovered first.
    fn walk(&self, store: &Path, depth: usize, out: &mut Vec<Candidate>) {
        if depth > self.max_depth {
            debug!("Nesting cap reached at {}", store.display());
            return;
        }

        let entries = match sorted_entries(store) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot read {}: {}", store.display(), e);
                return;
            }
        };

        let mut level: Vec<(String, PathBuf)> = Vec::new();
        for (name, path) in entries {
            if name.starts_with('.') || !path.is_dir() {
                continue;
            }
            if name.starts_with('@') {
                let scoped = match sorted_entries(&path) {
                    Ok(scoped) => scoped,
                    Err(e) => {
                        debug!("Cannot read scope {}: {}", path.display(), e);
                        continue;
                    }
                };
                for (sub, sub_path) in scoped {
                    if !sub.starts_with('.') && sub_path.is_dir() {
                        level.push((format!("{}/{}", name, sub), sub_path));
                    }
                }
            } else {
                level.push((name, path));
            }
        }

        let mut nested = Vec::new();
        for (name, dir) in level {
            let inner = dir.join(STORE_DIR);
            if let Some(candidate) = read_candidate(name, dir, None) {
                out.push(candidate);
            }
            if inner.is_dir() {
                nested.push(inner);
            }
        }

        for inner in nested {
            self.walk(&inner, depth + 1, out);
        }
    }
}

impl PackageDiscoverer for FlatStore {
    fn locate(&self, store: &Path) -> Vec<Candidate> {
        let mut out = Vec::new();
        self.walk(store, 0, &mut out);
        out
    }
}

/// pnpm style store: every `name@version` lives once under
/// `node_modules/.pnpm/<encoded>/node_modules/<name>`.
///
/// The project's own `node_modules/<name>` links select the version it
/// resolves, so linked candidates are located before all others and win
/// name lookups in the [`PackageIndex`](super::PackageIndex).
#[derive(Debug, Clone, Copy, Default)]
pub struct CentralStore;

impl CentralStore {
    /// Resolved targets of the top-level package links in `store`.
    fn linked_targets(store: &Path) -> HashSet<PathBuf> {
        let entries = match sorted_entries(store) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot read {}: {}", store.display(), e);
                return HashSet::new();
            }
        };

        let mut links = Vec::new();
        for (name, path) in entries {
            if name.starts_with('.') {
                continue;
            }
            if name.starts_with('@') {
                match sorted_entries(&path) {
                    Ok(scoped) => links.extend(scoped.into_iter().map(|(_, p)| p)),
                    Err(e) => debug!("Cannot read scope {}: {}", path.display(), e),
                }
            } else {
                links.push(path);
            }
        }

        links
            .into_iter()
            .filter_map(|link| match fs::canonicalize(&link) {
                Ok(target) => Some(target),
                Err(e) => {
                    trace!("Cannot resolve {}: {}", link.display(), e);
                    None
                }
            })
            .collect()
    }
}

impl PackageDiscoverer for CentralStore {
    fn locate(&self, store: &Path) -> Vec<Candidate> {
        let central = store.join(CENTRAL_STORE_DIR);
        let entries = match sorted_entries(&central) {
            Ok(entries) => entries,
            Err(e) => {
                debug!("Cannot read {}: {}", central.display(), e);
                return Vec::new();
            }
        };

        let mut out = Vec::new();
        for (entry, path) in entries {
            if entry == STORE_DIR || entry.starts_with('.') || !path.is_dir() {
                continue;
            }
            let Some((name, version)) = parse_store_entry(&entry) else {
                debug!("Skipping unparseable store entry {}", entry);
                continue;
            };
            let dir = path.join(STORE_DIR).join(&name);
            if let Some(candidate) = read_candidate(name, dir, Some(version)) {
                out.push(candidate);
            }
        }

        let linked = Self::linked_targets(store);
        if !linked.is_empty() {
            // Stable, so the remaining order stays by entry name.
            out.sort_by_cached_key(|c| {
                fs::canonicalize(&c.dir).map_or(true, |dir| !linked.contains(&dir))
            });
        }
        out
    }
}

/// Splits a central-store directory name into `(name, version)`.
///
/// Scoped packages are encoded `@scope+name@version`; the name ends at
/// the first `@` after the first `+`. Unscoped names split at the last
/// `@`. Peer suffixes are dropped first, both the parenthesized form
/// (`a@1.0.0(react@18.2.0)`) and the older underscore form
/// (`a@1.0.0_react@18.2.0`), so peer variants of one version share an
/// identity.
///
/// # Example
///
/// ```
/// use depscope::store::parse_store_entry;
///
/// assert_eq!(
///     parse_store_entry("@babel+core@7.24.0"),
///     Some(("@babel/core".to_string(), "7.24.0".to_string()))
/// );
/// assert_eq!(parse_store_entry("no-version"), None);
/// ```
pub fn parse_store_entry(entry: &str) -> Option<(String, String)> {
    let encoded = strip_peer_suffix(entry);

    let (name, version) = if let Some(rest) = encoded.strip_prefix('@') {
        let plus = rest.find('+')?;
        let scope = &rest[..plus];
        let after = &rest[plus + 1..];
        let at = after.find('@')?;
        let (bare, version) = (&after[..at], &after[at + 1..]);
        if scope.is_empty() || bare.is_empty() {
            return None;
        }
        (format!("@{}/{}", scope, bare), version)
    } else {
        let at = encoded.rfind('@')?;
        (encoded[..at].to_string(), &encoded[at + 1..])
    };

    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version.to_string()))
}

/// Cuts the peer suffix off a store entry name.
///
/// Semver versions never contain `_`, so the first `_` after the version
/// separator starts an underscore-style suffix.
fn strip_peer_suffix(entry: &str) -> &str {
    let entry = entry.find('(').map_or(entry, |i| &entry[..i]);
    let name_start = if entry.starts_with('@') {
        entry.find('+').unwrap_or(entry.len())
    } else {
        0
    };
    let Some(at) = entry[name_start..].find('@').map(|i| name_start + i) else {
        return entry;
    };
    entry[at..].find('_').map_or(entry, |i| &entry[..at + i])
}

/// Reads the manifest in `dir`; `None` when it is missing or malformed.
fn read_candidate(name: String, dir: PathBuf, version: Option<String>) -> Option<Candidate> {
    match read_manifest(&dir) {
        Ok(manifest) => Some(Candidate {
            version: version.unwrap_or_else(|| manifest.version_or_unknown()),
            dependencies: manifest.runtime_dependency_names(),
            name,
            dir,
        }),
        Err(e) => {
            trace!("Skipping {}: {}", dir.display(), e);
            None
        }
    }
}

/// Directory entries sorted by file name, for deterministic walks.
fn sorted_entries(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries: Vec<(String, PathBuf)> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some((entry.file_name().to_string_lossy().into_owned(), entry.path())),
            Err(e) => {
                trace!("Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Keeps the first candidate for each `(name, version)`.
fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|c| seen.insert((c.name.clone(), c.version.clone())))
        .collect()
}

/// Computes sizes in parallel, one package directory per work item.
///
/// Results keep candidate order, matching a sequential run.
fn measure(
    candidates: Vec<Candidate>,
    declared: &DeclaredDependencies,
    progress: &dyn DiscoveryProgress,
) -> Vec<Package> {
    let total = candidates.len();
    progress.candidates_located(total);
    let completed = AtomicUsize::new(0);

    candidates
        .into_par_iter()
        .map(|candidate| {
            let package = Package {
                size: dir_size(&candidate.dir),
                classification: declared.classify(&candidate.name),
                name: candidate.name,
                version: candidate.version,
                path: candidate.dir,
                dependencies: candidate.dependencies,
            };
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            progress.package_measured(&package, done, total);
            package
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    /// Writes `dir/package.json` and pads the directory to `size` bytes.
    pub fn write_package(dir: &Path, manifest: &str, size: u64) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("package.json"), manifest).unwrap();
        let pad = size
            .checked_sub(manifest.len() as u64)
            .expect("size smaller than manifest");
        fs::write(dir.join("index.js"), vec![b' '; pad as usize]).unwrap();
    }

    pub fn manifest(name: &str, version: &str, deps: &[&str]) -> String {
        let deps: Vec<String> = deps.iter().map(|d| format!("\"{}\": \"*\"", d)).collect();
        format!(
            r#"{{"name": "{}", "version": "{}", "dependencies": {{{}}}}}"#,
            name,
            version,
            deps.join(", ")
        )
    }
}
