//! Progress events emitted during discovery.
//!
//! The discoverer owns no display state; callers that want a status line
//! implement [`DiscoveryProgress`] and render however they like.

use super::package::Package;

/// Receives discovery events.
///
/// `package_measured` may be called from several worker threads at once,
/// in no particular order.
pub trait DiscoveryProgress: Sync {
    /// Called once candidates are located, before any size is computed.
    fn candidates_located(&self, _total: usize) {}

    /// Called after each package's size has been computed.
    fn package_measured(&self, _package: &Package, _completed: usize, _total: usize) {}
}

/// Ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl DiscoveryProgress for NoProgress {}
