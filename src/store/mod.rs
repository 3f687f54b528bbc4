//! Installed package store discovery.
//!
//! This module finds every package physically installed under a
//! project's `node_modules`, whichever package manager produced it.
//!
//! # Supported Layouts
//!
//! - **pnpm** - central store under `node_modules/.pnpm`
//! - **npm / yarn** - flat `node_modules` with nested conflict copies
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use depscope::parser::read_declared_dependencies;
//! use depscope::store::{discover_packages, Layout, NoProgress, PackageIndex};
//!
//! let root = Path::new(".");
//! let declared = read_declared_dependencies(root);
//! let layout = Layout::detect(root);
//! let packages = discover_packages(root, &declared, layout, &NoProgress)?;
//! let index = PackageIndex::from_packages(packages);
//! println!("{} packages installed", index.len());
//! ```

pub mod discover;
pub mod layout;
pub mod package;
pub mod progress;
pub mod size;

pub use discover::{
    discover_packages, discoverer_for, parse_store_entry, CentralStore, DiscoveryError,
    DiscoveryResult, FlatStore, PackageDiscoverer, MAX_NESTING_DEPTH,
};
pub use layout::{Layout, StoreKind, STORE_DIR};
pub use package::{Package, PackageIndex};
pub use progress::{DiscoveryProgress, NoProgress};
pub use size::{dir_size, format_size};
