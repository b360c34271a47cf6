use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures raised synchronously while composing modules onto a handle
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Not a valid directory: {}", .0.display())]
    InvalidDirectory(PathBuf),

    #[error("Invalid restricted scope format: {0}")]
    InvalidScopeFormat(String),

    #[error("Failed to import {module}.{property}, property already exists")]
    DuplicateProperty { module: String, property: String },

    #[error("Failed to load module {module}")]
    ModuleLoad {
        module: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to list module directory {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures delivered through a bundle emission's result
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("File exists: {}", .0.display())]
    FileExists(PathBuf),

    #[error("I/O failure on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cloneClass requested but no class path is known")]
    MissingClassPath,

    #[error("the composed handle was dropped before bundling")]
    HandleDropped,

    #[error("bundle task did not complete")]
    Task(#[from] tokio::task::JoinError),
}
