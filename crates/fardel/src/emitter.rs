//! Bundle emission: from a module graph to one self-hosted script
//!
//! The emitted artifact is a self-invoking function whose only argument is
//! a registry mapping each asset identity to a two-element entry: a factory
//! that wraps the asset's compiled code in
//! `function (require, module, exports) { … }`, and the asset's
//! specifier-to-identity table as a JSON object literal. Inside, a
//! miniature `require(id)` looks the entry up, builds a `localRequire`
//! closure that translates the module's own specifiers back to identities,
//! runs the factory against a fresh `module.exports`, and returns the
//! exports. `require(0)` at the end starts the entry module.
//!
//! There is no memoization: every `require` call re-runs the factory with a
//! brand-new exports object, so a module required twice executes its
//! top-level code twice. This diverges from single-evaluation module
//! semantics and is preserved as documented behavior, not fixed here.
//!
//! The runtime skeleton is a fixed template; the only dynamic insertions
//! are the identity (an integer), the JSON-serialized resolution table, and
//! the compiled code body. The code body is embedded verbatim: producing
//! text that cannot break out of its enclosing function is the extractor's
//! obligation.

use std::fmt::Write as _;

use crate::{
    graph::{FxIndexMap, ModuleGraph},
    types::AssetId,
};

/// Opening of the self-invoking runtime, up to the registry literal
const RUNTIME_PRELUDE: &str = r"(function (modules) {
  function require(id) {
    const [factory, mapping] = modules[id];

    function localRequire(name) {
      return require(mapping[name]);
    }

    const module = { exports: {} };

    factory(localRequire, module, module.exports);

    return module.exports;
  }

  require(0);
})({
";

/// Closing of the registry literal and the self-invocation
const RUNTIME_EPILOGUE: &str = "})\n";

/// Serialize the emitted runtime for `graph`.
///
/// Total over any well-formed graph; emission itself cannot fail.
pub fn emit(graph: &ModuleGraph) -> String {
    let mut bundle = String::from(RUNTIME_PRELUDE);

    for asset in graph {
        log::trace!("emitting asset {} ({})", asset.id, asset.path.display());
        let mapping = serialize_mapping(&asset.resolution);
        let _ = write!(
            bundle,
            "  {id}: [\n    function (require, module, exports) {{\n{code}\n    }},\n    \
             {mapping},\n  ],\n",
            id = asset.id,
            code = asset.code,
        );
    }

    bundle.push_str(RUNTIME_EPILOGUE);
    bundle
}

/// JSON object literal for a resolution table, in specifier order
fn serialize_mapping(resolution: &FxIndexMap<String, AssetId>) -> String {
    let ordered: FxIndexMap<&str, u32> = resolution
        .iter()
        .map(|(specifier, id)| (specifier.as_str(), id.as_u32()))
        .collect();
    serde_json::to_string(&ordered).expect("resolution table serializes to JSON")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        graph::{Asset, ModuleGraph},
        types::AssetId,
    };

    fn asset(id: u32, code: &str, resolution: &[(&str, u32)]) -> Asset {
        Asset {
            id: AssetId::new(id),
            path: PathBuf::from(format!("/app/{id}.js")),
            specifiers: resolution.iter().map(|(s, _)| (*s).to_owned()).collect(),
            code: code.to_owned(),
            resolution: resolution
                .iter()
                .map(|(s, id)| ((*s).to_owned(), AssetId::new(*id)))
                .collect(),
        }
    }

    fn graph_of(assets: Vec<Asset>) -> ModuleGraph {
        let mut graph = ModuleGraph::new();
        for asset in assets {
            graph.push(asset);
        }
        graph
    }

    #[test]
    fn bundle_invokes_the_entry_identity() {
        let bundle = emit(&graph_of(vec![asset(0, "console.log('hi');", &[])]));
        assert!(bundle.contains("require(0);"));
    }

    #[test]
    fn every_asset_gets_a_registry_entry() {
        let graph = graph_of(vec![
            asset(0, "", &[("./a.js", 1)]),
            asset(1, "", &[]),
        ]);
        let bundle = emit(&graph);
        assert!(bundle.contains("  0: ["));
        assert!(bundle.contains("  1: ["));
        assert_eq!(
            bundle.matches("function (require, module, exports)").count(),
            2
        );
    }

    #[test]
    fn mapping_is_serialized_in_specifier_order() {
        let graph = graph_of(vec![
            asset(0, "", &[("./b.js", 2), ("./a.js", 1)]),
            asset(1, "", &[]),
            asset(2, "", &[]),
        ]);
        let bundle = emit(&graph);
        assert!(bundle.contains(r#"{"./b.js":2,"./a.js":1}"#));
    }

    #[test]
    fn mapping_specifiers_are_quoted_as_json() {
        let graph = graph_of(vec![
            asset(0, "", &[("./it's.js", 1)]),
            asset(1, "", &[]),
        ]);
        let bundle = emit(&graph);
        assert!(bundle.contains(r#"{"./it's.js":1}"#));
    }

    #[test]
    fn code_is_embedded_verbatim() {
        let code = "const x = 1;\nconsole.log(x);";
        let bundle = emit(&graph_of(vec![asset(0, code, &[])]));
        assert!(bundle.contains(code));
    }

    #[test]
    fn runtime_allocates_fresh_exports_per_require() {
        // The skeleton itself pins the no-memoization contract: the module
        // record is created inside require, not cached outside it.
        let bundle = emit(&graph_of(vec![asset(0, "", &[])]));
        assert!(bundle.contains("const module = { exports: {} };"));
        assert!(!bundle.contains("cache"));
    }
}
