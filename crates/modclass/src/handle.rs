//! The shared aggregate object that modules are composed onto

use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

use crate::{
    bundler::Bundler,
    types::{PROPERTY_TITLE, Properties},
    value::Value,
};

/// A shared, mutable, insertion-ordered property bag.
///
/// Cloning a `Handle` yields another reference to the same object, so a
/// module that keeps its scope and mutates it later is observed by every
/// holder of the handle.
#[derive(Clone, Default)]
pub struct Handle {
    inner: Arc<RwLock<Properties>>,
}

/// Non-owning reference to a [`Handle`]
#[derive(Clone, Default)]
pub struct WeakHandle {
    inner: Weak<RwLock<Properties>>,
}

impl Handle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_properties(properties: Properties) -> Self {
        Self {
            inner: Arc::new(RwLock::new(properties)),
        }
    }

    // Every write leaves the map consistent, so a poisoned lock is still usable
    fn read(&self) -> RwLockReadGuard<'_, Properties> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Properties> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    /// Set a property, replacing any previous value in place
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.write().insert(name.into(), value.into());
    }

    /// Add all `properties` only if none of their names is taken.
    ///
    /// On collision nothing is added and the first taken name is returned.
    pub fn try_extend(&self, properties: Properties) -> Result<(), String> {
        let mut current = self.write();
        if let Some(taken) = properties.keys().find(|name| current.contains_key(*name)) {
            return Err(taken.clone());
        }
        current.extend(properties);
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.write().shift_remove(name)
    }

    /// Property names in enumeration order
    pub fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Ordered snapshot of every property
    pub fn properties(&self) -> Properties {
        self.read().clone()
    }

    /// Invoke a function property.
    ///
    /// The lock is released before the body runs, so the body may freely read
    /// or mutate this same handle. Missing or non-function properties yield
    /// `None`.
    pub fn call(&self, name: &str, args: &[Value]) -> Option<Value> {
        let function = self.read().get(name)?.as_function()?.clone();
        Some(function.call(args))
    }

    /// The bundling capability, if composition attached one
    pub fn bundler(&self) -> Option<Bundler> {
        match self.read().get(PROPERTY_TITLE)? {
            Value::Bundler(bundler) => Some(bundler.clone()),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn downgrade(&self) -> WeakHandle {
        WeakHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl WeakHandle {
    pub fn upgrade(&self) -> Option<Handle> {
        self.inner.upgrade().map(|inner| Handle { inner })
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Handle {
    // Only names: values may themselves hold this handle
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("keys", &self.keys()).finish()
    }
}

impl fmt::Debug for WeakHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakHandle")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Handle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_properties(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
