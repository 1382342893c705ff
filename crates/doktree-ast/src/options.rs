//! Build configuration.
//!
//! [`Options`] is the construction-time configuration a document keeps for
//! its whole life. Attribute seeds passed here become the document's
//! initial attributes and, unless marked soft, its locked overrides (see
//! [`Document`](crate::document::Document) for the marker conventions).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::attributes::{AttrMap, AttrValue};
use crate::document::Document;

/// Safe-mode level, least to most restrictive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafeMode {
    Unsafe,
    Safe,
    Server,
    Secure,
}

impl SafeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafeMode::Unsafe => "unsafe",
            SafeMode::Safe => "safe",
            SafeMode::Server => "server",
            SafeMode::Secure => "secure",
        }
    }

    /// Numeric level used by the `safe-mode-level` attribute.
    pub fn level(&self) -> u8 {
        match self {
            SafeMode::Unsafe => 0,
            SafeMode::Safe => 1,
            SafeMode::Server => 10,
            SafeMode::Secure => 20,
        }
    }

    pub fn from_name(name: &str) -> Option<SafeMode> {
        match name {
            "unsafe" => Some(SafeMode::Unsafe),
            "safe" => Some(SafeMode::Safe),
            "server" => Some(SafeMode::Server),
            "secure" => Some(SafeMode::Secure),
            _ => None,
        }
    }
}

impl Default for SafeMode {
    fn default() -> Self {
        SafeMode::Secure
    }
}

/// Document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Doctype {
    Article,
    Book,
    Manpage,
    Inline,
}

impl Doctype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Doctype::Article => "article",
            Doctype::Book => "book",
            Doctype::Manpage => "manpage",
            Doctype::Inline => "inline",
        }
    }

    pub fn from_name(name: &str) -> Option<Doctype> {
        match name {
            "article" => Some(Doctype::Article),
            "book" => Some(Doctype::Book),
            "manpage" => Some(Doctype::Manpage),
            "inline" => Some(Doctype::Inline),
            _ => None,
        }
    }
}

impl Default for Doctype {
    fn default() -> Self {
        Doctype::Article
    }
}

/// Construction-time configuration for a document build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub safe: SafeMode,
    pub backend: String,
    pub doctype: Doctype,
    pub base_dir: Option<PathBuf>,
    pub sourcemap: bool,
    pub standalone: bool,
    pub compat_mode: bool,
    /// Attribute seeds applied at construction; locked unless marked soft.
    pub attributes: AttrMap,
    /// Names of registered extension processors.
    pub extensions: Vec<String>,
    pub(crate) nested: bool,
    pub(crate) inherited: AttrMap,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            safe: SafeMode::default(),
            backend: "html5".to_string(),
            doctype: Doctype::default(),
            base_dir: None,
            sourcemap: false,
            standalone: false,
            compat_mode: false,
            attributes: AttrMap::new(),
            extensions: Vec::new(),
            nested: false,
            inherited: AttrMap::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }

    /// Options for a document nested inside `parent` (a table cell, an
    /// included sub-document): the parent's resolved attributes are
    /// inherited unlocked and the child is flagged as nested.
    pub fn nested_of(parent: &Document) -> Self {
        Options {
            safe: parent.safe(),
            backend: parent.backend().to_string(),
            doctype: parent.doctype(),
            base_dir: parent.base_dir().map(PathBuf::from),
            sourcemap: parent.sourcemap(),
            compat_mode: parent.compat_mode(),
            nested: true,
            inherited: parent.attributes().clone(),
            ..Options::default()
        }
    }

    pub fn with_safe(mut self, safe: SafeMode) -> Self {
        self.safe = safe;
        self
    }

    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    pub fn with_doctype(mut self, doctype: Doctype) -> Self {
        self.doctype = doctype;
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(base_dir.into());
        self
    }

    pub fn with_sourcemap(mut self, sourcemap: bool) -> Self {
        self.sourcemap = sourcemap;
        self
    }

    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    pub fn with_compat_mode(mut self, compat_mode: bool) -> Self {
        self.compat_mode = compat_mode;
        self
    }

    /// Adds an attribute seed.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name, value);
        self
    }

    /// Registers an extension processor by name.
    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.push(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.safe, SafeMode::Secure);
        assert_eq!(options.backend, "html5");
        assert_eq!(options.doctype, Doctype::Article);
        assert!(!options.sourcemap);
        assert!(!options.standalone);
        assert!(options.attributes.is_empty());
    }

    #[test]
    fn test_builder_chain() {
        let options = Options::new()
            .with_safe(SafeMode::Server)
            .with_backend("docbook5")
            .with_doctype(Doctype::Book)
            .with_base_dir("/srv/docs")
            .with_sourcemap(true)
            .with_attribute("version", "1.0")
            .with_extension("pikchr");

        assert_eq!(options.safe, SafeMode::Server);
        assert_eq!(options.backend, "docbook5");
        assert_eq!(options.doctype, Doctype::Book);
        assert_eq!(options.base_dir.as_deref(), Some(std::path::Path::new("/srv/docs")));
        assert!(options.sourcemap);
        assert_eq!(options.attributes.get_str("version"), Some("1.0"));
        assert_eq!(options.extensions, ["pikchr"]);
    }

    #[test]
    fn test_safe_mode_levels() {
        assert_eq!(SafeMode::Unsafe.level(), 0);
        assert_eq!(SafeMode::Safe.level(), 1);
        assert_eq!(SafeMode::Server.level(), 10);
        assert_eq!(SafeMode::Secure.level(), 20);
        assert!(SafeMode::Safe < SafeMode::Secure);
    }

    #[test]
    fn test_enum_names() {
        assert_eq!(SafeMode::from_name("server"), Some(SafeMode::Server));
        assert_eq!(SafeMode::from_name("sandbox"), None);
        assert_eq!(Doctype::from_name("book"), Some(Doctype::Book));
        assert_eq!(Doctype::from_name("letter"), None);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let options = Options::new()
            .with_doctype(Doctype::Manpage)
            .with_attribute("toc", true);
        let json = serde_json::to_string(&options).unwrap();
        let back: Options = serde_json::from_str(&json).unwrap();
        assert_eq!(back, options);
    }
}
