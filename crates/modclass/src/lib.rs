//! Compose an object out of a directory of modules, then optionally write the
//! composed object back out as a standalone JavaScript loader.
//!
//! ```no_run
//! use std::{path::Path, sync::Arc};
//!
//! use modclass::{BundleOptions, Composer, Handle, ScopeMap, StaticLoader, Value};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let loader = StaticLoader::new().with_module("version", Value::from("1.0.0"));
//! let handle = Handle::new();
//! Composer::new(Arc::new(loader)).compose(&handle, &ScopeMap::new(), Some(Path::new("modules")))?;
//!
//! if let Some(bundler) = handle.bundler() {
//!     bundler.create_bundle(BundleOptions::default()).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod bundler;
pub mod class_clone;
pub mod composer;
pub mod config;
pub mod discovery;
pub mod emitter;
pub mod error;
pub mod fs;
pub mod handle;
pub mod loader;
pub mod module;
pub mod types;
pub mod value;

pub use bundler::{BundleOptions, BundleReport, Bundler};
pub use composer::{ComposeOptions, Composer, ScopeMap};
pub use config::Config;
pub use emitter::Dependency;
pub use error::{BundleError, ComposeError};
pub use handle::Handle;
pub use loader::{ManifestLoader, ModuleLoader, StaticLoader};
pub use module::ModuleExport;
pub use types::Properties;
pub use value::{Function, Value};
