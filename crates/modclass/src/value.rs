//! Dynamic property values
//!
//! Properties merged onto a [`Handle`] are either plain data, shared objects,
//! or functions. A [`Function`] carries two things: the literal source text
//! that the bundler writes out, and a native body that runs in-process.
//! Only the source text survives bundling, so any state captured by the
//! native closure is lost in the emitted file.

use std::{fmt, sync::Arc};

use crate::{bundler::Bundler, handle::Handle};

/// Native body of a [`Function`]
pub type NativeFn = dyn Fn(&[Value]) -> Value + Send + Sync;

/// A callable property together with its source text
#[derive(Clone)]
pub struct Function {
    source: Arc<str>,
    native: Arc<NativeFn>,
}

impl Function {
    /// Create a function from its emitted source and its in-process body
    pub fn new<F>(source: impl Into<String>, native: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            source: Arc::from(source.into()),
            native: Arc::new(native),
        }
    }

    /// Create a function known only by its source text.
    ///
    /// Calling it in-process yields [`Value::Undefined`].
    pub fn from_source(source: impl Into<String>) -> Self {
        Self::new(source, |_| Value::Undefined)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.native)(args)
    }

    /// Identity comparison: two functions are equal only if they share a body
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.native, &other.native)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.source).finish()
    }
}

/// Any value a property can hold
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Function),
    /// A shared object; clones alias the same properties
    Object(Handle),
    /// The bundling capability attached by the composer
    Bundler(Bundler),
}

impl Value {
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub const fn as_function(&self) -> Option<&Function> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    pub const fn as_object(&self) -> Option<&Handle> {
        match self {
            Self::Object(handle) => Some(handle),
            _ => None,
        }
    }

    /// Constructor-style name of the value's shape, used in error messages
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "Boolean",
            Self::Number(_) => "Number",
            Self::String(_) => "String",
            Self::Function(_) => "Function",
            Self::Object(_) => "Object",
            Self::Bundler(_) => "Bundler",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Function(a), Self::Function(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Bundler(a), Self::Bundler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Direct textual interpolation, as a template literal would render the value.
///
/// Strings are written unquoted and objects collapse to `[object Object]`;
/// the bundler emits exactly this text.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write_number(f, *n),
            Self::String(s) => f.write_str(s),
            Self::Function(function) => f.write_str(function.source()),
            Self::Object(_) | Self::Bundler(_) => f.write_str("[object Object]"),
        }
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        f.write_str("NaN")
    } else if n.is_infinite() {
        f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        // -0 renders as 0
        f.write_str("0")
    } else {
        write!(f, "{n}")
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Function> for Value {
    fn from(value: Function) -> Self {
        Self::Function(value)
    }
}

impl From<Handle> for Value {
    fn from(value: Handle) -> Self {
        Self::Object(value)
    }
}
