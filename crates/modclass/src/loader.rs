//! Module loading
//!
//! A [`ModuleLoader`] turns one directory entry into a [`ModuleExport`].
//! Two loaders ship with the crate:
//!
//! - [`StaticLoader`]: modules written in Rust and registered by name. The
//!   module directory decides which of them are installed.
//! - [`ManifestLoader`]: modules declared in TOML, either `<name>.toml` or
//!   `<name>/index.toml`.
//!
//! # Manifest format
//!
//! ```toml
//! greeting = "hello"
//! retries = 3
//! shout = { function = "function () { return this.greeting.toUpperCase(); }" }
//! limits = { max = 10 }
//! ```
//!
//! The document is exported as a mapping. Inline tables with a single
//! `function` key become source-only functions, other tables become objects.
//! A document whose only key is `default` exports that value as-is.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result, anyhow, bail};
use log::trace;

use crate::{
    fs::{FileSystem, OsFileSystem},
    handle::Handle,
    module::ModuleExport,
    types::{FxIndexMap, Properties},
    value::{Function, Value},
};

const MANIFEST_EXTENSION: &str = "toml";
const MANIFEST_SUFFIX: &str = ".toml";
const MANIFEST_INDEX: &str = "index.toml";
const DEFAULT_EXPORT_KEY: &str = "default";
const FUNCTION_KEY: &str = "function";

pub trait ModuleLoader: Send + Sync + Debug {
    /// Load the module at `path` and return what it exposes
    fn load(&self, path: &Path) -> Result<ModuleExport>;

    /// Name under which the module at directory entry `entry` is known
    fn module_name<'e>(&self, entry: &'e str) -> &'e str {
        entry
    }
}

fn entry_name(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Module path has no usable name: {}", path.display()))
}

/// Registry of in-process modules keyed by directory entry name
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    modules: FxIndexMap<String, ModuleExport>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `export` for the entry called `name`
    #[must_use]
    pub fn with_module(mut self, name: impl Into<String>, export: impl Into<ModuleExport>) -> Self {
        self.register(name, export);
        self
    }

    pub fn register(&mut self, name: impl Into<String>, export: impl Into<ModuleExport>) {
        self.modules.insert(name.into(), export.into());
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, path: &Path) -> Result<ModuleExport> {
        let name = entry_name(path)?;
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow!("No module registered for entry '{name}'"))
    }
}

/// Loads declarative TOML modules through a [`FileSystem`]
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    fs: Arc<dyn FileSystem>,
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new(Arc::new(OsFileSystem))
    }
}

impl ManifestLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    fn manifest_path(&self, path: &Path) -> Result<PathBuf> {
        if self.fs.is_dir(path) {
            return Ok(path.join(MANIFEST_INDEX));
        }
        if path.extension().is_some_and(|ext| ext == MANIFEST_EXTENSION) {
            return Ok(path.to_path_buf());
        }
        bail!("Not a module manifest: {}", path.display())
    }
}

impl ModuleLoader for ManifestLoader {
    fn load(&self, path: &Path) -> Result<ModuleExport> {
        let manifest = self.manifest_path(path)?;
        trace!("Reading module manifest {}", manifest.display());
        let source = self
            .fs
            .read_to_string(&manifest)
            .with_context(|| format!("Failed to read {}", manifest.display()))?;
        parse_manifest(&source).with_context(|| format!("Invalid manifest {}", manifest.display()))
    }

    // `version.toml` is the module `version`
    fn module_name<'e>(&self, entry: &'e str) -> &'e str {
        entry
            .strip_suffix(MANIFEST_SUFFIX)
            .filter(|stem| !stem.is_empty())
            .unwrap_or(entry)
    }
}

/// Parse a manifest document into the export it declares
pub fn parse_manifest(source: &str) -> Result<ModuleExport> {
    let mut table: toml::Table = toml::from_str(source)?;

    if table.len() == 1 {
        if let Some(value) = table.remove(DEFAULT_EXPORT_KEY) {
            return Ok(ModuleExport::Opaque(convert(value)?));
        }
    }

    Ok(ModuleExport::Properties(convert_table(table)?))
}

fn convert_table(table: toml::Table) -> Result<Properties> {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = convert(value).with_context(|| format!("in key '{key}'"))?;
            Ok((key, value))
        })
        .collect()
}

fn convert(value: toml::Value) -> Result<Value> {
    Ok(match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(_) => bail!("arrays cannot be exported"),
        toml::Value::Table(mut table) => {
            if table.len() == 1 && matches!(table.get(FUNCTION_KEY), Some(toml::Value::String(_))) {
                if let Some(toml::Value::String(source)) = table.remove(FUNCTION_KEY) {
                    return Ok(Value::Function(Function::from_source(source)));
                }
            }
            Value::Object(Handle::from_properties(convert_table(table)?))
        }
    })
}
