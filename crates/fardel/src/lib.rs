//! fardel: a JavaScript source bundler
//!
//! Discovers the dependency graph reachable from one entry file and emits a
//! single self-contained script with its own miniature CommonJS-style
//! runtime, for environments where only one script can run and no module
//! loader exists.

pub mod config;
pub mod emitter;
pub mod extractor;
pub mod graph;
pub mod graph_builder;
pub mod orchestrator;
pub mod types;
