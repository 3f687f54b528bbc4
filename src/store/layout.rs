//! Package-store layout detection.
//!
//! Lockfiles at the project root are the strongest signal. Without one,
//! marker files left inside `node_modules/` by each package manager are
//! checked. Detection never fails; an unrecognized project falls back to
//! [`Layout::Unknown`], which is scanned like a flat store.

use std::fmt;
use std::path::Path;

use log::debug;
use serde::Serialize;

/// Directory holding installed packages.
pub const STORE_DIR: &str = "node_modules";

/// Directory under [`STORE_DIR`] holding the pnpm content store.
pub const CENTRAL_STORE_DIR: &str = ".pnpm";

/// The package manager whose on-disk layout was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Central content store under `node_modules/.pnpm`.
    Pnpm,
    /// Flat `node_modules` with nested copies for conflicts.
    Npm,
    /// Same physical layout as npm.
    Yarn,
    /// No signal found.
    Unknown,
}

/// How packages are physically arranged for a [`Layout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreKind {
    CentralStore,
    Flat,
}

const LOCKFILES: [(&str, Layout); 3] = [
    ("pnpm-lock.yaml", Layout::Pnpm),
    ("package-lock.json", Layout::Npm),
    ("yarn.lock", Layout::Yarn),
];

const STORE_MARKERS: [(&str, Layout); 4] = [
    (CENTRAL_STORE_DIR, Layout::Pnpm),
    (".package-lock.json", Layout::Npm),
    (".yarn-integrity", Layout::Yarn),
    (".yarn-state.yml", Layout::Yarn),
];

impl Layout {
    /// Detects the layout of the project at `root`.
    pub fn detect(root: &Path) -> Layout {
        for (file, layout) in LOCKFILES {
            if root.join(file).is_file() {
                debug!("Detected {} from lockfile {}", layout, file);
                return layout;
            }
        }

        let store = root.join(STORE_DIR);
        for (marker, layout) in STORE_MARKERS {
            if store.join(marker).exists() {
                debug!("Detected {} from store marker {}", layout, marker);
                return layout;
            }
        }

        debug!("No layout signal under {}, assuming flat store", root.display());
        Layout::Unknown
    }

    /// Physical arrangement to scan for this layout.
    pub fn store_kind(&self) -> StoreKind {
        match self {
            Layout::Pnpm => StoreKind::CentralStore,
            Layout::Npm | Layout::Yarn | Layout::Unknown => StoreKind::Flat,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Layout::Pnpm => "pnpm",
            Layout::Npm => "npm",
            Layout::Yarn => "yarn",
            Layout::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}
