//! Lazy discovery of the modules under a directory

use std::{
    path::{Path, PathBuf},
    vec,
};

use log::trace;

use crate::{
    error::ComposeError,
    fs::FileSystem,
    loader::ModuleLoader,
    module::ModuleDescriptor,
};

/// Finite, single-pass sequence of the modules in one directory.
///
/// Entries are listed once up front and sorted so composition order does not
/// depend on the platform's listing order. Each module is loaded only when
/// the iterator reaches it, so a failure stops discovery at that entry.
#[derive(Debug)]
pub struct ModuleDiscovery<'a> {
    directory: PathBuf,
    entries: vec::IntoIter<String>,
    loader: &'a dyn ModuleLoader,
}

impl<'a> ModuleDiscovery<'a> {
    pub fn new(
        fs: &dyn FileSystem,
        loader: &'a dyn ModuleLoader,
        directory: &Path,
    ) -> Result<Self, ComposeError> {
        let mut entries = fs.list_dir(directory).map_err(|source| ComposeError::Io {
            path: directory.to_path_buf(),
            source,
        })?;
        entries.sort();
        trace!(
            "Discovered {} module entries in {}",
            entries.len(),
            directory.display()
        );

        Ok(Self {
            directory: directory.to_path_buf(),
            entries: entries.into_iter(),
            loader,
        })
    }
}

impl Iterator for ModuleDiscovery<'_> {
    type Item = Result<ModuleDescriptor, ComposeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.entries.next()?;
        let path = self.directory.join(&entry);
        let name = self.loader.module_name(&entry).to_owned();
        Some(match self.loader.load(&path) {
            Ok(export) => Ok(ModuleDescriptor { name, path, export }),
            Err(source) => Err(ComposeError::ModuleLoad {
                module: name,
                source,
            }),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::{fs::OsFileSystem, loader::StaticLoader, value::Value};

    #[test]
    fn test_entries_are_yielded_sorted() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["gamma", "alpha", "beta"] {
            fs::create_dir(temp_dir.path().join(name)).unwrap();
        }
        let loader = StaticLoader::new()
            .with_module("alpha", Value::from(1))
            .with_module("beta", Value::from(2))
            .with_module("gamma", Value::from(3));

        let names: Vec<String> = ModuleDiscovery::new(&OsFileSystem, &loader, temp_dir.path())
            .unwrap()
            .map(|descriptor| descriptor.unwrap().name)
            .collect();

        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_loading_is_lazy() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("alpha")).unwrap();
        fs::create_dir(temp_dir.path().join("unregistered")).unwrap();
        let loader = StaticLoader::new().with_module("alpha", Value::from(1));

        let mut discovery = ModuleDiscovery::new(&OsFileSystem, &loader, temp_dir.path()).unwrap();

        assert_eq!(discovery.size_hint(), (2, Some(2)));
        assert!(discovery.next().unwrap().is_ok());
        let error = discovery.next().unwrap().unwrap_err();
        assert!(matches!(error, ComposeError::ModuleLoad { ref module, .. } if module == "unregistered"));
        assert!(discovery.next().is_none());
    }
}
