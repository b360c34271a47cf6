//! Loader text generation
//!
//! The emitted loader is a single function that rebuilds every serialized
//! property on whatever object it is given:
//!
//! ```text
//! const extend = require('./extend');
//!
//! module.exports = _this => { const _modclass = {
//! 	a: _ => 'aaa',
//! 	};
//! 	for (let prop in _modclass) { _this[prop] = _modclass[prop]; }
//! };
//! ```
//!
//! Values are interpolated textually (see [`Value`]'s `Display`): functions
//! contribute their source, everything else its plain text form.

use serde::Deserialize;

use crate::{
    types::{PROPERTY_TITLE, Properties},
    value::Value,
};

const LOADER_OPEN: &str = "module.exports = _this => { const _modclass = {";
const LOADER_CLOSE: &str =
    "\t};\n\tfor (let prop in _modclass) { _this[prop] = _modclass[prop]; }\n};";

/// A `require` emitted at the top of the loader
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Dependency {
    /// Binding name
    pub name: String,
    /// Require path; defaults to `./<name>`
    #[serde(default)]
    pub path: Option<String>,
    /// Declaration keyword; defaults to `const`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Dependency {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            kind: None,
        }
    }

    /// `<type> <name> = require('<path>');`
    pub fn render(&self) -> String {
        let kind = self.kind.as_deref().unwrap_or("const");
        match &self.path {
            Some(path) => format!("{kind} {} = require('{path}');", self.name),
            None => format!("{kind} {} = require('./{}');", self.name, self.name),
        }
    }
}

/// Whether `name` is left out of the bundle.
///
/// An exclusion matches when it occurs anywhere in the property name.
pub fn is_excluded(name: &str, exclude_props: &[String]) -> bool {
    name == PROPERTY_TITLE || exclude_props.iter().any(|excluded| name.contains(excluded.as_str()))
}

/// Rendered loader and the properties it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loader {
    pub text: String,
    pub properties: Vec<String>,
}

pub fn render_loader(
    properties: &Properties,
    dependencies: &[Dependency],
    exclude_props: &[String],
) -> Loader {
    let mut lines: Vec<String> = dependencies.iter().map(Dependency::render).collect();
    lines.push(String::new());
    lines.push(LOADER_OPEN.to_owned());

    let mut emitted = Vec::new();
    for (name, value) in properties {
        if is_excluded(name, exclude_props) {
            continue;
        }
        lines.push(render_property(name, value));
        emitted.push(name.clone());
    }

    lines.push(LOADER_CLOSE.to_owned());

    Loader {
        text: lines.join("\n"),
        properties: emitted,
    }
}

fn render_property(name: &str, value: &Value) -> String {
    format!("\t{name}: {value},")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{handle::Handle, value::Function};

    fn sample() -> Properties {
        let mut properties = Properties::default();
        properties.insert(
            "greet".to_owned(),
            Value::from(Function::new("_ => 'hi'", |_| Value::from("hi"))),
        );
        properties.insert("label".to_owned(), Value::from("'static'"));
        properties.insert("config".to_owned(), Value::from(Handle::new()));
        properties
    }

    #[test]
    fn test_dependency_rendering() {
        assert_eq!(
            Dependency::new("extend").render(),
            "const extend = require('./extend');"
        );
        let dependency = Dependency {
            name: "path".to_owned(),
            path: Some("path".to_owned()),
            kind: Some("let".to_owned()),
        };
        assert_eq!(dependency.render(), "let path = require('path');");
    }

    #[test]
    fn test_exclusions_match_substrings() {
        let exclude = vec!["secret".to_owned()];
        assert!(is_excluded("secretKey", &exclude));
        assert!(is_excluded("topsecret", &exclude));
        assert!(!is_excluded("public", &exclude));
        assert!(is_excluded(PROPERTY_TITLE, &[]));
    }

    #[test]
    fn test_loader_skips_excluded_properties() {
        let loader = render_loader(&sample(), &[], &["config".to_owned()]);

        assert_eq!(loader.properties, vec!["greet", "label"]);
        assert_eq!(
            loader.text,
            [
                "",
                "module.exports = _this => { const _modclass = {",
                "\tgreet: _ => 'hi',",
                "\tlabel: 'static',",
                "\t};",
                "\tfor (let prop in _modclass) { _this[prop] = _modclass[prop]; }",
                "};",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_loader_preamble_lists_dependencies() {
        let loader = render_loader(&Properties::default(), &[Dependency::new("extend")], &[]);

        assert_eq!(
            loader.text,
            "const extend = require('./extend');\n\nmodule.exports = _this => { const _modclass = {\n\t};\n\tfor (let prop in _modclass) { _this[prop] = _modclass[prop]; }\n};"
        );
    }
}
