//! Disk footprint summary of the installed packages.

use serde::Serialize;

use crate::parser::DependencyType;
use crate::store::{Package, PackageIndex};

/// Totals for one classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub dep_type: DependencyType,
    pub count: usize,
    pub size: u64,
}

/// Aggregate and per-package sizes.
#[derive(Debug, Clone, Serialize)]
pub struct SizeReport {
    /// Physical size of the whole installed-package root, including
    /// files that belong to no package.
    pub store_size: u64,
    /// Sum of all package sizes. Nested copies in a flat store are also
    /// counted inside their parent, so this can exceed `store_size`.
    pub packages_size: u64,
    pub package_count: usize,
    /// Non-empty classifications, in priority order.
    pub by_type: Vec<TypeSummary>,
    /// Largest packages first, truncated to the requested count.
    pub largest: Vec<Package>,
}

impl SizeReport {
    /// Summarizes `index`; `top_n` bounds only the `largest` list.
    pub fn new(index: &PackageIndex, store_size: u64, top_n: usize) -> Self {
        let by_type = DependencyType::ALL
            .iter()
            .filter_map(|&dep_type| {
                let (count, size) = index
                    .iter()
                    .filter(|p| p.classification == dep_type)
                    .fold((0usize, 0u64), |(c, s), p| (c + 1, s + p.size));
                (count > 0).then_some(TypeSummary {
                    dep_type,
                    count,
                    size,
                })
            })
            .collect();

        let mut largest: Vec<Package> = index.packages().to_vec();
        largest.sort_by(|a, b| b.size.cmp(&a.size));
        largest.truncate(top_n);

        Self {
            store_size,
            packages_size: index.total_size(),
            package_count: index.len(),
            by_type,
            largest,
        }
    }
}
