//! End-to-end bundling pipeline
//!
//! One strictly sequential batch: build the graph from the entry file, then
//! hand the finished graph to the emitter exactly once. Nothing survives a
//! run; independent invocations share no state.

use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

use anyhow::{Context, Result};

use crate::{config::Config, emitter, extractor::EsModuleExtractor, graph_builder::GraphBuilder};

/// Bundle the module graph reachable from `entry` into a single script
pub fn bundle(entry: &Path, config: &Config) -> Result<String> {
    log::info!("bundling from entry {}", entry.display());

    let builder = GraphBuilder::new(EsModuleExtractor::new()).with_max_assets(config.max_assets);
    let graph = builder.build(entry)?;

    let bundle = emitter::emit(&graph);
    log::debug!("emitted {} bytes for {} assets", bundle.len(), graph.len());
    Ok(bundle)
}

/// Bundle and deliver to the configured sink: a file when `config.output`
/// is set, standard output otherwise
pub fn bundle_to_sink(entry: &Path, config: &Config) -> Result<()> {
    let bundle = bundle(entry, config)?;

    match &config.output {
        Some(path) => {
            fs::write(path, &bundle)
                .with_context(|| format!("failed to write bundle to {}", path.display()))?;
            log::info!("wrote bundle to {}", path.display());
        }
        None => {
            io::stdout()
                .lock()
                .write_all(bundle.as_bytes())
                .context("failed to write bundle to stdout")?;
        }
    }
    Ok(())
}
