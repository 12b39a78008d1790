//! Shared type definitions for the fardel crate
//!
//! This module contains common types that are used across multiple components
//! of the bundler, ensuring consistency and avoiding circular dependencies.

/// Unique identifier for an asset
///
/// Identities are assigned in strictly increasing order during graph
/// discovery, starting at 0. The entry asset always carries identity 0,
/// which is what the emitted runtime invokes on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u32);

impl AssetId {
    /// The identity reserved for the entry asset
    pub const ENTRY: Self = Self(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the underlying u32 value of the AssetId
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Get the identity as a graph position
    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
