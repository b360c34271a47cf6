//! The bundling capability attached to a composed handle
//!
//! [`Bundler::create_bundle`] serializes the handle into a loader file and,
//! on request, writes a standalone copy of the consumer's class file next to
//! it. Output paths are planned and checked, and the class source is read,
//! before anything is written; the writes themselves happen in order and are
//! not transactional.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, info};
use serde::Deserialize;

use crate::{
    class_clone::{CloneSettings, CloneWarning, clone_class},
    emitter::{Dependency, render_loader},
    error::BundleError,
    fs::FileSystem,
    handle::{Handle, WeakHandle},
};

const DEFAULT_BUNDLE_FILENAME: &str = "modclass.bundle.js";
const DEFAULT_LIBRARY_NAME: &str = "modclass";
const CLASS_BUNDLE_SUFFIX: &str = ".bundle.js";

/// Emission options; unset fields fall back to the composer's caller
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BundleOptions {
    /// File name of the generated loader
    pub filename: String,
    /// Replace existing output files
    pub overwrite: bool,
    /// Requires emitted at the top of the loader
    pub dependencies: Vec<Dependency>,
    /// Substrings of property names to leave out
    pub exclude_props: Vec<String>,
    /// Also write a standalone copy of the class file
    pub clone_class: bool,
    /// Class file to copy; defaults to the composer's caller
    pub class_path: Option<PathBuf>,
    /// Destination of both files; defaults to the caller's directory
    pub output_dir: Option<PathBuf>,
    /// Token that identifies a require of this library in the class file
    pub library_name: String,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            filename: DEFAULT_BUNDLE_FILENAME.to_owned(),
            overwrite: false,
            dependencies: Vec::new(),
            exclude_props: Vec::new(),
            clone_class: false,
            class_path: None,
            output_dir: None,
            library_name: DEFAULT_LIBRARY_NAME.to_owned(),
        }
    }
}

/// Defaults derived from the composer's caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleDefaults {
    pub class_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// Resolved output locations for one emission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePlan {
    pub bundle_path: PathBuf,
    /// Source class file and its standalone copy, when a class path is known
    pub class: Option<ClassPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPlan {
    pub source: PathBuf,
    pub output: PathBuf,
    /// File name up to the first `.`
    pub stem: String,
}

impl BundlePlan {
    pub fn new(options: &BundleOptions, defaults: &BundleDefaults) -> Self {
        let output_dir = options
            .output_dir
            .as_ref()
            .or(defaults.output_dir.as_ref())
            .cloned()
            .unwrap_or_else(|| PathBuf::from("."));

        let class = options
            .class_path
            .as_ref()
            .or(defaults.class_path.as_ref())
            .map(|source| {
                let stem = class_stem(source);
                ClassPlan {
                    output: output_dir.join(format!("{stem}{CLASS_BUNDLE_SUFFIX}")),
                    source: source.clone(),
                    stem,
                }
            });

        Self {
            bundle_path: output_dir.join(&options.filename),
            class,
        }
    }

    /// Paths that will be written, in write order
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.bundle_path.as_path())
            .chain(self.class.as_ref().map(|class| class.output.as_path()))
    }
}

fn class_stem(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy())
        .unwrap_or_default();
    file_name.split('.').next().unwrap_or_default().to_owned()
}

/// What an emission produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleReport {
    pub bundle_path: PathBuf,
    /// Properties serialized into the loader, in order
    pub properties: Vec<String>,
    /// Written standalone class file, if cloning was requested
    pub class_path: Option<PathBuf>,
    pub warnings: Vec<CloneWarning>,
}

/// Bundling capability of a composed handle.
///
/// Holds the handle weakly: the handle owns this capability as a property.
#[derive(Debug, Clone)]
pub struct Bundler {
    handle: WeakHandle,
    fs: Arc<dyn FileSystem>,
    defaults: BundleDefaults,
}

impl Bundler {
    pub(crate) fn new(handle: WeakHandle, fs: Arc<dyn FileSystem>, defaults: BundleDefaults) -> Self {
        Self {
            handle,
            fs,
            defaults,
        }
    }

    pub const fn defaults(&self) -> &BundleDefaults {
        &self.defaults
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.handle.ptr_eq(&other.handle)
    }

    /// Emit the bundle and resolve once it is written.
    ///
    /// Inside a Tokio runtime the writes run on its blocking pool. Polled from
    /// any other executor, the emission runs inline on the polling thread.
    pub async fn create_bundle(&self, options: BundleOptions) -> Result<BundleReport, BundleError> {
        let handle = self.handle.upgrade().ok_or(BundleError::HandleDropped)?;
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No Tokio runtime, emitting bundle inline");
            return emit(&handle, self.fs.as_ref(), &self.defaults, &options);
        };
        let fs = Arc::clone(&self.fs);
        let defaults = self.defaults.clone();
        runtime
            .spawn_blocking(move || emit(&handle, fs.as_ref(), &defaults, &options))
            .await?
    }

    /// Emit the bundle on the current thread
    pub fn create_bundle_blocking(&self, options: &BundleOptions) -> Result<BundleReport, BundleError> {
        let handle = self.handle.upgrade().ok_or(BundleError::HandleDropped)?;
        emit(&handle, self.fs.as_ref(), &self.defaults, options)
    }
}

fn emit(
    handle: &Handle,
    fs: &dyn FileSystem,
    defaults: &BundleDefaults,
    options: &BundleOptions,
) -> Result<BundleReport, BundleError> {
    let plan = BundlePlan::new(options, defaults);

    if options.clone_class && plan.class.is_none() {
        return Err(BundleError::MissingClassPath);
    }
    if !options.overwrite {
        if let Some(existing) = plan.outputs().find(|path| fs.exists(path)) {
            return Err(BundleError::FileExists(existing.to_path_buf()));
        }
    }

    // Read before any write: a bad class path must leave no output behind
    let class = match plan.class.filter(|_| options.clone_class) {
        Some(class) => {
            let source = fs
                .read_to_string(&class.source)
                .map_err(|source| BundleError::Io {
                    path: class.source.clone(),
                    source,
                })?;
            Some((class, source))
        }
        None => None,
    };

    let loader = render_loader(
        &handle.properties(),
        &options.dependencies,
        &options.exclude_props,
    );
    write(fs, &plan.bundle_path, &loader.text)?;
    info!(
        "Wrote {} properties to {}",
        loader.properties.len(),
        plan.bundle_path.display()
    );

    let mut report = BundleReport {
        bundle_path: plan.bundle_path,
        properties: loader.properties,
        class_path: None,
        warnings: Vec::new(),
    };

    let Some((class, source)) = class else {
        return Ok(report);
    };

    let cloned = clone_class(
        &source,
        &CloneSettings {
            bundle_filename: &options.filename,
            library_name: &options.library_name,
            fallback_name: &class.stem,
        },
    );
    debug!(
        "Cloned {} as class {:?}",
        class.source.display(),
        cloned.class_name
    );
    write(fs, &class.output, &cloned.text)?;

    report.class_path = Some(class.output);
    report.warnings = cloned.warnings;
    Ok(report)
}

fn write(fs: &dyn FileSystem, path: &Path, contents: &str) -> Result<(), BundleError> {
    fs.write(path, contents).map_err(|source| BundleError::Io {
        path: path.to_path_buf(),
        source,
    })
}
