//! Bundling configuration
//!
//! Options come from an optional TOML file (`fardel.toml` by convention)
//! and can be overridden field by field from the command line.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where to write the bundle; `None` means standard output
    pub output: Option<PathBuf>,

    /// Upper bound on discovered assets before the build aborts.
    ///
    /// Unset means unbounded, which also means a cyclic dependency chain
    /// never terminates. Set it when bundling sources you do not control.
    pub max_assets: Option<usize>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unbounded_stdout() {
        let config = Config::default();
        assert!(config.output.is_none());
        assert!(config.max_assets.is_none());
    }

    #[test]
    fn loads_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fardel.toml");
        fs::write(&path, "output = \"dist/bundle.js\"\nmax_assets = 512\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.output, Some(PathBuf::from("dist/bundle.js")));
        assert_eq!(config.max_assets, Some(512));
    }

    #[test]
    fn rejects_unknown_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fardel.toml");
        fs::write(&path, "entry = \"main.js\"\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
