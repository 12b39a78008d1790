//! Work-list discovery of the module graph
//!
//! Starting from the entry file, the builder repeatedly asks its extractor
//! for a module's specifiers, resolves each specifier against the module's
//! containing directory, and extracts the resolved file as a brand-new
//! asset with the next unused identity. Processing order is FIFO over the
//! ever-growing asset list, so identities come out in breadth-first
//! discovery order and the entry asset is always identity 0.
//!
//! Two simplifications are load-bearing and deliberate:
//!
//! - No path-based deduplication: every specifier edge produces a new
//!   asset, even when two edges reach the same file (a diamond yields two
//!   records with two identities).
//! - No cycle detection: a cyclic specifier chain grows the work-list
//!   forever. `Config::max_assets` is the only guard; without it the build
//!   does not terminate.

use std::{
    collections::VecDeque,
    path::{Component, Path, PathBuf},
};

use anyhow::{Context, Result, bail};

use crate::{
    extractor::AssetExtractor,
    graph::{Asset, FxIndexMap, ModuleGraph},
    types::AssetId,
};

/// Builds a [`ModuleGraph`] by transitively extracting assets
pub struct GraphBuilder<E> {
    extractor: E,
    /// Next identity to hand out; owned by this builder so independent
    /// builds never share a counter
    next_id: u32,
    /// Optional cap on discovered assets; exceeded means the build aborts
    max_assets: Option<usize>,
}

impl<E: AssetExtractor> GraphBuilder<E> {
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            next_id: 0,
            max_assets: None,
        }
    }

    /// Abort the build once the graph would exceed `limit` assets.
    ///
    /// This is the externally imposed step limit that turns a cyclic
    /// dependency chain into a reported error instead of an endless build.
    pub fn with_max_assets(mut self, limit: Option<usize>) -> Self {
        self.max_assets = limit;
        self
    }

    fn allocate_id(&mut self) -> AssetId {
        let id = AssetId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Extract the file at `path` and register it as a new asset
    fn discover(&mut self, graph: &mut ModuleGraph, path: PathBuf) -> Result<AssetId> {
        if let Some(limit) = self.max_assets {
            if graph.len() >= limit {
                bail!(
                    "asset limit of {limit} exceeded while extracting {}; \
                     the dependency graph likely contains a cycle",
                    path.display()
                );
            }
        }

        let extracted = self.extractor.extract(&path)?;
        let id = self.allocate_id();
        log::debug!(
            "asset {id}: {} ({} dependencies)",
            path.display(),
            extracted.specifiers.len()
        );
        graph.push(Asset {
            id,
            path,
            specifiers: extracted.specifiers,
            code: extracted.code,
            resolution: FxIndexMap::default(),
        });
        Ok(id)
    }

    /// Build the full dependency graph reachable from `entry`
    ///
    /// The first failing extraction aborts the build; no partial graph is
    /// returned.
    pub fn build(mut self, entry: &Path) -> Result<ModuleGraph> {
        let entry_path = absolutize(entry);
        let mut graph = ModuleGraph::new();
        let mut pending: VecDeque<AssetId> = VecDeque::new();

        let entry_id = self
            .discover(&mut graph, entry_path)
            .context("failed to extract entry module")?;
        debug_assert_eq!(entry_id, AssetId::ENTRY);
        pending.push_back(entry_id);

        while let Some(current) = pending.pop_front() {
            // Snapshot what resolution needs; the graph grows while this
            // asset's dependencies are being discovered
            let (importer, specifiers) = {
                let asset = graph.get(current).expect("pending id is in the graph");
                (asset.path.clone(), asset.specifiers.clone())
            };
            let dir = importer
                .parent()
                .map_or_else(PathBuf::new, Path::to_path_buf);

            for specifier in specifiers {
                let resolved = resolve_specifier(&dir, &specifier);
                let child = self.discover(&mut graph, resolved).with_context(|| {
                    format!(
                        "failed to resolve '{specifier}' imported by {}",
                        importer.display()
                    )
                })?;
                graph
                    .get_mut(current)
                    .expect("pending id is in the graph")
                    .resolution
                    .insert(specifier, child);
                pending.push_back(child);
            }
        }

        log::info!("discovered {} assets", graph.len());
        Ok(graph)
    }
}

/// Join a raw specifier onto the importing module's directory.
///
/// A specifier that names no existing file is retried with `.js` appended,
/// so `./a` and `./a.js` both reach `a.js`. Appending keeps dots inside
/// the specifier intact: `./dep.v2` retries `dep.v2.js`, never `dep.js`.
/// When neither form exists the as-written path is returned and the
/// subsequent extraction reports the read error.
fn resolve_specifier(dir: &Path, specifier: &str) -> PathBuf {
    let joined = normalize(&dir.join(specifier));
    if joined.is_file() {
        return joined;
    }
    let with_suffix = normalize(&dir.join(format!("{specifier}.js")));
    if with_suffix.is_file() {
        return with_suffix;
    }
    joined
}

/// Make `path` absolute against the current directory, without touching
/// the filesystem
fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        let base = std::env::current_dir().unwrap_or_default();
        normalize(&base.join(path))
    }
}

/// Fold `.` and `..` segments lexically.
///
/// `Path::canonicalize` would resolve symlinks and fail outright on a
/// missing file, which would misattribute resolution failures; extraction
/// is where a bad path must surface.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::extractor::ExtractedModule;

    /// In-memory extractor keyed by file name, for driving the builder
    /// without a filesystem
    struct MapExtractor(Vec<(&'static str, ExtractedModule)>);

    impl AssetExtractor for MapExtractor {
        fn extract(&self, path: &Path) -> Result<ExtractedModule> {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            self.0
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, module)| module.clone())
                .ok_or_else(|| anyhow::anyhow!("no module at {}", path.display()))
        }
    }

    fn module(specifiers: &[&str]) -> ExtractedModule {
        ExtractedModule {
            specifiers: specifiers.iter().map(|s| (*s).to_owned()).collect(),
            code: String::new(),
        }
    }

    #[test]
    fn entry_asset_has_identity_zero() {
        let extractor = MapExtractor(vec![("entry.js", module(&[]))]);
        let graph = GraphBuilder::new(extractor).build(Path::new("/app/entry.js")).unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.entry().unwrap().id, AssetId::ENTRY);
    }

    #[test]
    fn identities_follow_breadth_first_discovery_order() {
        // entry -> a, b; a -> c. Expected identities: entry 0, a 1, b 2, c 3.
        let extractor = MapExtractor(vec![
            ("entry.js", module(&["./a.js", "./b.js"])),
            ("a.js", module(&["./c.js"])),
            ("b.js", module(&[])),
            ("c.js", module(&[])),
        ]);
        let graph = GraphBuilder::new(extractor).build(Path::new("/app/entry.js")).unwrap();

        assert_eq!(graph.len(), 4);
        let entry = graph.entry().unwrap();
        assert_eq!(entry.resolution["./a.js"], AssetId::new(1));
        assert_eq!(entry.resolution["./b.js"], AssetId::new(2));
        let a = graph.get(AssetId::new(1)).unwrap();
        assert_eq!(a.resolution["./c.js"], AssetId::new(3));
    }

    #[test]
    fn resolution_keys_match_declared_specifiers() {
        let extractor = MapExtractor(vec![
            ("entry.js", module(&["./a.js", "./b.js"])),
            ("a.js", module(&[])),
            ("b.js", module(&[])),
        ]);
        let graph = GraphBuilder::new(extractor).build(Path::new("/app/entry.js")).unwrap();
        let entry = graph.entry().unwrap();
        let keys: Vec<_> = entry.resolution.keys().cloned().collect();
        assert_eq!(keys, entry.specifiers);
    }

    #[test]
    fn diamond_dependency_is_duplicated_not_shared() {
        // Both a and b import shared.js; each edge mints a fresh asset.
        let extractor = MapExtractor(vec![
            ("entry.js", module(&["./a.js", "./b.js"])),
            ("a.js", module(&["./shared.js"])),
            ("b.js", module(&["./shared.js"])),
            ("shared.js", module(&[])),
        ]);
        let graph = GraphBuilder::new(extractor).build(Path::new("/app/entry.js")).unwrap();

        // 5 discovery operations over 4 distinct files
        assert_eq!(graph.len(), 5);
        let a = graph.get(AssetId::new(1)).unwrap();
        let b = graph.get(AssetId::new(2)).unwrap();
        assert_ne!(a.resolution["./shared.js"], b.resolution["./shared.js"]);
    }

    #[test]
    fn cyclic_graph_aborts_at_the_asset_limit() {
        let extractor = MapExtractor(vec![
            ("a.js", module(&["./b.js"])),
            ("b.js", module(&["./a.js"])),
        ]);
        let err = GraphBuilder::new(extractor)
            .with_max_assets(Some(16))
            .build(Path::new("/app/a.js"))
            .unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("asset limit"), "{chain}");
    }

    #[test]
    fn extraction_failure_aborts_with_the_importing_module() {
        let extractor = MapExtractor(vec![("entry.js", module(&["./missing.js"]))]);
        let err = GraphBuilder::new(extractor)
            .build(Path::new("/app/entry.js"))
            .unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("./missing.js"), "{chain}");
        assert!(chain.contains("entry.js"), "{chain}");
    }

    #[test]
    fn normalize_folds_dot_segments() {
        assert_eq!(
            normalize(Path::new("/app/src/../lib/./util.js")),
            PathBuf::from("/app/lib/util.js")
        );
    }
}
