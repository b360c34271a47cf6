//! `modclass.toml` configuration
//!
//! ```toml
//! [compose]
//! enable-bundler = true
//! caller-path = "src/TestClass.js"
//!
//! [bundle]
//! filename = "modclass.bundle.js"
//! clone-class = true
//! exclude-props = ["debug"]
//! dependencies = [{ name = "extend", path = "extend" }]
//! ```
//!
//! Every key is optional; missing keys keep their defaults.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

use crate::{bundler::BundleOptions, composer::ComposeOptions, fs::FileSystem};

pub const CONFIG_FILENAME: &str = "modclass.toml";

/// Overrides `bundle.output-dir`
pub const OUTPUT_DIR_ENV: &str = "MODCLASS_OUTPUT_DIR";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    pub compose: ComposeOptions,
    pub bundle: BundleOptions,
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).context("Failed to parse modclass configuration")
    }

    pub fn load(fs: &dyn FileSystem, path: &Path) -> Result<Self> {
        let source = fs
            .read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&source)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `modclass.toml` from `dir` if present, defaults otherwise
    pub fn discover(fs: &dyn FileSystem, dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILENAME);
        if fs.exists(&path) && !fs.is_dir(&path) {
            Self::load(fs, &path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply environment overrides on top of the file values
    #[must_use]
    pub fn apply_env(mut self) -> Self {
        if let Some(output_dir) = std::env::var_os(OUTPUT_DIR_ENV).filter(|dir| !dir.is_empty()) {
            debug!("{OUTPUT_DIR_ENV} overrides bundle output directory");
            self.bundle.output_dir = Some(PathBuf::from(output_dir));
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{emitter::Dependency, fs::OsFileSystem};

    #[test]
    fn test_empty_document_is_default() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.compose.enable_bundler);
        assert_eq!(config.bundle.filename, "modclass.bundle.js");
        assert!(!config.bundle.overwrite);
    }

    #[test]
    fn test_caller_values_merge_over_defaults() {
        let config = Config::from_toml_str(
            r#"
[compose]
enable-bundler = false
caller-path = "src/TestClass.js"
scope = {}
path = false

[bundle]
clone-class = true
exclude-props = ["debug"]
dependencies = [{ name = "extend", path = "extend", type = "var" }, { name = "util" }]
"#,
        )
        .unwrap();

        assert!(!config.compose.enable_bundler);
        assert_eq!(
            config.compose.caller_path,
            Some(PathBuf::from("src/TestClass.js"))
        );
        assert!(config.bundle.clone_class);
        assert_eq!(config.bundle.filename, "modclass.bundle.js");
        assert_eq!(config.bundle.exclude_props, vec!["debug"]);
        assert_eq!(
            config.bundle.dependencies,
            vec![
                Dependency {
                    name: "extend".to_owned(),
                    path: Some("extend".to_owned()),
                    kind: Some("var".to_owned()),
                },
                Dependency::new("util"),
            ]
        );
    }

    #[test]
    fn test_load_reads_through_the_filesystem() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let fs = OsFileSystem;
        fs.write(
            &temp_dir.path().join(CONFIG_FILENAME),
            "[bundle]\nfilename = \"app.bundle.js\"\n",
        )
        .unwrap();

        let config = Config::discover(&fs, temp_dir.path()).unwrap();
        assert_eq!(config.bundle.filename, "app.bundle.js");

        let error = Config::load(&fs, &temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(error.to_string().starts_with("Failed to read config file"));
    }

    #[test]
    fn test_invalid_document_is_reported() {
        let error = Config::from_toml_str("[bundle]\noverwrite = 'yes'").unwrap_err();
        assert!(error.to_string().contains("Failed to parse modclass configuration"));
    }
}
