//! Duplicate-version detection.
//!
//! Packages are grouped by name only, so every name installed at more
//! than one version forms a [`DuplicateGroup`].
//!
//! Wasted space assumes the largest installed copy is the one actually
//! loaded and every other copy is overhead. Module resolution order is
//! not simulated, so this is an estimate.

use std::collections::HashMap;

use serde::Serialize;

use crate::store::Package;

/// One installed copy within a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledVersion {
    pub version: String,
    pub size: u64,
}

/// A package name installed at two or more versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub name: String,
    /// Every installed copy, in discovery order.
    pub versions: Vec<InstalledVersion>,
    /// Sum of all copies' sizes.
    pub total_size: u64,
}

impl DuplicateGroup {
    /// Size of the largest copy.
    pub fn largest_size(&self) -> u64 {
        self.versions.iter().map(|v| v.size).max().unwrap_or(0)
    }

    /// Bytes spent on every copy except the largest.
    pub fn wasted_size(&self) -> u64 {
        self.total_size - self.largest_size()
    }

    /// Installed version strings, in discovery order.
    pub fn version_list(&self) -> Vec<&str> {
        self.versions.iter().map(|v| v.version.as_str()).collect()
    }
}

/// Groups packages by name and returns names with several copies,
/// largest total first. Ties keep first-discovered order.
pub fn find_duplicates<'a, I>(packages: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = &'a Package>,
{
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for pkg in packages {
        let pos = *positions.entry(pkg.name.as_str()).or_insert_with(|| {
            groups.push(DuplicateGroup {
                name: pkg.name.clone(),
                versions: Vec::new(),
                total_size: 0,
            });
            groups.len() - 1
        });
        let group = &mut groups[pos];
        group.versions.push(InstalledVersion {
            version: pkg.version.clone(),
            size: pkg.size,
        });
        group.total_size += pkg.size;
    }

    let mut duplicates: Vec<DuplicateGroup> =
        groups.into_iter().filter(|g| g.versions.len() >= 2).collect();
    duplicates.sort_by(|a, b| b.total_size.cmp(&a.total_size));
    duplicates
}

/// Total wasted bytes across all groups.
pub fn total_wasted(groups: &[DuplicateGroup]) -> u64 {
    groups.iter().map(DuplicateGroup::wasted_size).sum()
}
