//! Shared type definitions for the modclass crate

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use rustc_hash::FxHasher;

use crate::value::Value;

/// Insertion-ordered map with the Fx hasher
pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Named properties exported by a module or held by a handle, in enumeration order
pub type Properties = FxIndexMap<String, Value>;

/// Name of the marker property that carries the bundling capability
pub const PROPERTY_TITLE: &str = "__modclass";

/// Conventional module directory, relative to the consumer's file
pub const DEFAULT_MODULE_DIRECTORY: &str = "modules";
