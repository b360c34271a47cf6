//! Module composition
//!
//! The [`Composer`] walks a module directory, resolves each module's export
//! against its scope and merges the resulting properties onto a [`Handle`].
//! Merging is strictly additive: a module exporting a name that already
//! exists on the handle contributes nothing and aborts composition, while
//! modules merged before it stay in place.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, trace};
use serde::Deserialize;

use crate::{
    bundler::{BundleDefaults, Bundler},
    discovery::ModuleDiscovery,
    error::ComposeError,
    fs::{FileSystem, OsFileSystem},
    handle::Handle,
    loader::{ManifestLoader, ModuleLoader},
    types::{DEFAULT_MODULE_DIRECTORY, FxIndexMap, PROPERTY_TITLE},
    value::Value,
};

/// Alternative scopes, keyed by module name.
///
/// Modules without an entry receive the handle being composed.
#[derive(Debug, Clone, Default)]
pub struct ScopeMap {
    scopes: FxIndexMap<String, Handle>,
}

impl ScopeMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_scope(mut self, module: impl Into<String>, scope: Handle) -> Self {
        self.insert(module, scope);
        self
    }

    pub fn insert(&mut self, module: impl Into<String>, scope: Handle) {
        self.scopes.insert(module.into(), scope);
    }

    pub fn get(&self, module: &str) -> Option<&Handle> {
        self.scopes.get(module)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Accepts only a plain object whose entries are objects.
///
/// `undefined` and `null` mean "no alternative scopes".
impl TryFrom<Value> for ScopeMap {
    type Error = ComposeError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let object = match value {
            Value::Undefined | Value::Null => return Ok(Self::new()),
            Value::Object(object) => object,
            other => return Err(ComposeError::InvalidScopeFormat(other.type_name().to_owned())),
        };

        let mut scopes = Self::new();
        for (module, scope) in object.properties() {
            match scope {
                Value::Object(scope) => scopes.insert(module, scope),
                other => {
                    return Err(ComposeError::InvalidScopeFormat(format!(
                        "{module}: {}",
                        other.type_name()
                    )));
                }
            }
        }
        Ok(scopes)
    }
}

/// Options recognized by [`Composer::compose`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ComposeOptions {
    /// Attach the bundling capability to the handle after merging
    pub enable_bundler: bool,
    /// Source file of the consumer; locates the default module directory
    /// and seeds the bundler's class path and output directory
    pub caller_path: Option<PathBuf>,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            enable_bundler: true,
            caller_path: None,
        }
    }
}

impl ComposeOptions {
    /// `<caller dir>/modules`, or `modules` relative to the working directory
    pub fn default_module_dir(&self) -> PathBuf {
        self.caller_dir()
            .map_or_else(|| PathBuf::from(DEFAULT_MODULE_DIRECTORY), |dir| {
                dir.join(DEFAULT_MODULE_DIRECTORY)
            })
    }

    fn caller_dir(&self) -> Option<&Path> {
        self.caller_path.as_deref().and_then(Path::parent)
    }

    fn bundle_defaults(&self) -> BundleDefaults {
        BundleDefaults {
            class_path: self.caller_path.clone(),
            output_dir: self.caller_dir().map(Path::to_path_buf),
        }
    }
}

/// Merges the modules of a directory onto a handle
#[derive(Debug, Clone)]
pub struct Composer {
    loader: Arc<dyn ModuleLoader>,
    fs: Arc<dyn FileSystem>,
    options: ComposeOptions,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new(Arc::new(ManifestLoader::default()))
    }
}

impl Composer {
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            loader,
            fs: Arc::new(OsFileSystem),
            options: ComposeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ComposeOptions) -> Self {
        self.options = options;
        self
    }

    pub const fn options(&self) -> &ComposeOptions {
        &self.options
    }

    /// Merge every module under `module_dir` onto `handle`.
    ///
    /// Without a directory the conventional `modules` directory next to the
    /// caller is used. Stops at the first failure; properties merged before it
    /// stay on the handle.
    pub fn compose(
        &self,
        handle: &Handle,
        scopes: &ScopeMap,
        module_dir: Option<&Path>,
    ) -> Result<(), ComposeError> {
        let module_dir = module_dir.map_or_else(|| self.options.default_module_dir(), Path::to_path_buf);

        if !self.fs.is_dir(&module_dir) {
            return Err(ComposeError::InvalidDirectory(module_dir));
        }

        for descriptor in ModuleDiscovery::new(self.fs.as_ref(), self.loader.as_ref(), &module_dir)? {
            let descriptor = descriptor?;
            let scope = scopes.get(&descriptor.name).unwrap_or(handle);
            debug!(
                "Initializing module {} ({:?}) with {} scope",
                descriptor.name,
                descriptor.export,
                if scope.ptr_eq(handle) { "class" } else { "restricted" }
            );

            let properties = descriptor.export.resolve(&descriptor.name, scope);
            let names: Vec<String> = properties.keys().cloned().collect();
            if let Err(property) = handle.try_extend(properties) {
                return Err(ComposeError::DuplicateProperty {
                    module: descriptor.name,
                    property,
                });
            }
            trace!("Attached {} from {}: {names:?}", names.len(), descriptor.name);
        }

        if self.options.enable_bundler {
            let bundler = Bundler::new(
                handle.downgrade(),
                Arc::clone(&self.fs),
                self.options.bundle_defaults(),
            );
            handle.set(PROPERTY_TITLE, Value::Bundler(bundler));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_scope_map_rejects_non_objects() {
        let error = ScopeMap::try_from(Value::from("scope")).unwrap_err();
        assert!(matches!(error, ComposeError::InvalidScopeFormat(ref shape) if shape == "String"));
        assert_eq!(error.to_string(), "Invalid restricted scope format: String");
    }

    #[test]
    fn test_scope_map_rejects_non_object_entries() {
        let scopes: Handle = [("testLibrary4", 5)].into_iter().collect();
        let error = ScopeMap::try_from(Value::from(scopes)).unwrap_err();
        assert!(matches!(error, ComposeError::InvalidScopeFormat(ref shape) if shape == "testLibrary4: Number"));
    }

    #[test]
    fn test_scope_map_accepts_objects_and_absence() {
        let restricted = Handle::new();
        let scopes = Handle::new();
        scopes.set("testLibrary4", restricted.clone());

        let map = ScopeMap::try_from(Value::from(scopes)).unwrap();
        assert!(map.get("testLibrary4").unwrap().ptr_eq(&restricted));
        assert!(ScopeMap::try_from(Value::Undefined).unwrap().is_empty());
        assert!(ScopeMap::try_from(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_default_module_dir_follows_caller() {
        let options = ComposeOptions {
            caller_path: Some(PathBuf::from("/project/src/TestClass.js")),
            ..ComposeOptions::default()
        };
        assert_eq!(
            options.default_module_dir(),
            PathBuf::from("/project/src/modules")
        );
        assert_eq!(
            ComposeOptions::default().default_module_dir(),
            PathBuf::from("modules")
        );
    }
}
