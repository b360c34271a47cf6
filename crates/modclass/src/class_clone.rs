//! Standalone copy of the consumer's class file
//!
//! The copy stops requiring the library and requires the generated loader
//! instead, and registers its class on `global` rather than exporting it.
//! Nothing here parses JavaScript: a single forward scan over the lines
//! looks for
//!
//! - the first `require(...)` that mentions the library, rewritten to the
//!   loader file;
//! - the first `class <Name>` declaration, whose name is then fixed;
//! - the first `module.exports` after that declaration, replaced with
//!   `global.<Name> = <Name>;`.
//!
//! Anything the scan misses is patched with a fallback line and reported as
//! a [`CloneWarning`].

use std::fmt;

use cow_utils::CowUtils;
use log::warn;
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};

static CLASS_DECLARATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"class +(\w+) *\{?").expect("class pattern is valid"));

static REQUIRE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"require\(.*?\)").expect("require pattern is valid"));

const EXPORT_MARKER: &str = "module.exports";
const REQUIRE_MARKER: &str = "require";

/// A heuristic step that fell back to a generated line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneWarning {
    /// No require of the library was found; one was inserted after line 1
    UnresolvedDereference,
    /// No export after a class declaration; a global assignment was appended
    MissingExport,
}

impl fmt::Display for CloneWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedDereference => f.write_str(
                "Could not dereference properly, check the requires for the modclass bundle.",
            ),
            Self::MissingExport => f.write_str(
                "Could not add export properly, check the global reference at the bottom of the \
                 class.",
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CloneSettings<'a> {
    /// File name of the generated loader, required as `./<name>`
    pub bundle_filename: &'a str,
    /// Token identifying a require of this library
    pub library_name: &'a str,
    /// Global name to use when no class declaration is found
    pub fallback_name: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedClass {
    pub text: String,
    pub class_name: Option<String>,
    pub warnings: Vec<CloneWarning>,
}

/// Rewrite `source` into a standalone, self-registering class file
pub fn clone_class(source: &str, settings: &CloneSettings<'_>) -> ClonedClass {
    let mut lines: Vec<String> = source.split('\n').map(str::to_owned).collect();
    let loader_require = format!("require('./{}')", settings.bundle_filename);

    let mut class_name: Option<String> = None;
    let mut dereferenced = false;
    let mut exported = false;

    for line in &mut lines {
        if !dereferenced && line.contains(REQUIRE_MARKER) && line.contains(settings.library_name) {
            let rewritten = REQUIRE_CALL
                .replace(line.as_str(), NoExpand(&loader_require))
                .into_owned();
            *line = rewritten;
            dereferenced = true;
        }

        if let Some(name) = &class_name {
            if !exported && line.contains(EXPORT_MARKER) {
                *line = global_assignment(name);
                exported = true;
            }
        } else {
            class_name = CLASS_DECLARATION
                .captures(line.trim())
                .map(|captures| captures[1].to_owned());
        }
    }

    let mut warnings = Vec::new();

    if !dereferenced {
        let binding = settings.library_name.cow_replace('-', "_");
        lines.insert(
            lines.len().min(1),
            format!("const {binding} = {loader_require};"),
        );
        warnings.push(CloneWarning::UnresolvedDereference);
    }

    if !exported {
        let name = class_name.as_deref().unwrap_or(settings.fallback_name);
        lines.push(global_assignment(name));
        warnings.push(CloneWarning::MissingExport);
    }

    for warning in &warnings {
        warn!("{warning}");
    }

    ClonedClass {
        text: lines.join("\n"),
        class_name,
        warnings,
    }
}

fn global_assignment(name: &str) -> String {
    format!("global.{name} = {name};")
}
