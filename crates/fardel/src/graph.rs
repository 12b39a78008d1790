//! Asset and dependency graph data model
//!
//! The graph is the single source of truth for asset identity during a
//! bundling run. It is an ordered collection of assets in discovery order:
//! the entry asset first, then each asset's dependencies in the order their
//! specifiers were declared, breadth-first. An asset's position in the
//! collection always equals its identity.
//!
//! The graph is deliberately NOT deduplicated by path: two assets that
//! happen to point at the same file are distinct records with distinct
//! identities, each independently extracted. Likewise there is no cycle
//! handling at this layer. Both are documented simplifications of this
//! bundler, not defects (see `GraphBuilder` for the consequences).

use std::path::PathBuf;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::types::AssetId;

/// Type alias for FxHasher-based IndexMap
pub type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// One discovered module
#[derive(Debug, Clone)]
pub struct Asset {
    /// Unique identity, assigned at discovery time
    pub id: AssetId,
    /// Absolute, normalized location of the source file. Used to resolve
    /// this asset's relative specifiers against its containing directory.
    pub path: PathBuf,
    /// Raw dependency specifiers in source appearance order, not deduplicated
    pub specifiers: Vec<String>,
    /// Compiled (CommonJS) body text, opaque to the graph layer
    pub code: String,
    /// Mapping from each specifier to the identity it resolved to.
    ///
    /// Empty until the builder has processed this asset's dependencies;
    /// afterwards its key set equals the set of values in `specifiers`.
    /// Insertion order follows specifier order, which keeps the serialized
    /// form of the table deterministic.
    pub resolution: FxIndexMap<String, AssetId>,
}

/// Ordered collection of all assets discovered from the entry file
#[derive(Debug, Default)]
pub struct ModuleGraph {
    assets: Vec<Asset>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an asset, which must carry the next unused identity
    pub(crate) fn push(&mut self, asset: Asset) {
        debug_assert_eq!(asset.id.as_usize(), self.assets.len());
        self.assets.push(asset);
    }

    /// Look up an asset by identity
    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(id.as_usize())
    }

    pub(crate) fn get_mut(&mut self, id: AssetId) -> Option<&mut Asset> {
        self.assets.get_mut(id.as_usize())
    }

    /// The entry asset. Present in every graph produced by a successful
    /// build, since discovery starts from it.
    pub fn entry(&self) -> Option<&Asset> {
        self.assets.first()
    }

    /// Number of discovered assets. Counts discovery operations, not
    /// distinct files: a diamond dependency contributes one asset per edge
    /// traversed.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Iterate assets in discovery order
    pub fn iter(&self) -> std::slice::Iter<'_, Asset> {
        self.assets.iter()
    }
}

impl<'a> IntoIterator for &'a ModuleGraph {
    type Item = &'a Asset;
    type IntoIter = std::slice::Iter<'a, Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.iter()
    }
}
