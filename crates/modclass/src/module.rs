//! Module descriptors and the shapes a module can export

use std::{fmt, path::PathBuf, sync::Arc};

use crate::{handle::Handle, types::Properties, value::Value};

/// Module initializer: receives its scope, returns the properties to merge
pub type Initializer = Arc<dyn Fn(&Handle) -> Properties + Send + Sync>;

/// What a module exposes once loaded
#[derive(Clone)]
pub enum ModuleExport {
    /// Invoked with the module's scope; the result is merged
    Callable(Initializer),
    /// Merged unchanged
    Properties(Properties),
    /// Merged as a single property named after the module
    Opaque(Value),
}

impl ModuleExport {
    pub fn callable<F>(init: F) -> Self
    where
        F: Fn(&Handle) -> Properties + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(init))
    }

    /// Turn the export into the properties to merge for module `name`
    pub fn resolve(&self, name: &str, scope: &Handle) -> Properties {
        match self {
            Self::Callable(init) => init(scope),
            Self::Properties(properties) => properties.clone(),
            Self::Opaque(value) => {
                let mut properties = Properties::default();
                properties.insert(name.to_owned(), value.clone());
                properties
            }
        }
    }
}

impl fmt::Debug for ModuleExport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Callable"),
            Self::Properties(properties) => f
                .debug_tuple("Properties")
                .field(&properties.keys().collect::<Vec<_>>())
                .finish(),
            Self::Opaque(value) => f.debug_tuple("Opaque").field(value).finish(),
        }
    }
}

impl From<Properties> for ModuleExport {
    fn from(properties: Properties) -> Self {
        Self::Properties(properties)
    }
}

impl From<Value> for ModuleExport {
    fn from(value: Value) -> Self {
        Self::Opaque(value)
    }
}

/// One discovered module: a directory entry and what it exports
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// Module name as given by the loader; keys the scope map and names
    /// opaque exports
    pub name: String,
    pub path: PathBuf,
    pub export: ModuleExport,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_opaque_export_is_keyed_by_module_name() {
        let export = ModuleExport::from(Value::from(42));
        let properties = export.resolve("answer", &Handle::new());

        assert_eq!(properties.len(), 1);
        assert_eq!(properties.get("answer"), Some(&Value::from(42)));
    }

    #[test]
    fn test_properties_export_is_merged_unchanged() {
        let mut exported = Properties::default();
        exported.insert("prop2".to_owned(), Value::from("module"));
        let properties = ModuleExport::from(exported).resolve("lib", &Handle::new());

        assert_eq!(properties.keys().collect::<Vec<_>>(), vec!["prop2"]);
    }

    #[test]
    fn test_callable_export_receives_scope() {
        let scope: Handle = [("greeting", "hi")].into_iter().collect();
        let export = ModuleExport::callable(|scope| {
            let mut properties = Properties::default();
            properties.insert("seen".to_owned(), scope.get("greeting").unwrap_or_default());
            properties
        });

        let properties = export.resolve("lib", &scope);

        assert_eq!(properties.get("seen"), Some(&Value::from("hi")));
    }
}
