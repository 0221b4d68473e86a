//! Shared type definitions for the bindle crate
//!
//! This module contains the identity types used by every stage of the bundler,
//! from resolution through emission.

use std::{fmt, path::Path, sync::Arc};

/// Canonical identifier of one physical source file
///
/// The value is the canonicalized absolute path of the file. Two specifiers that
/// resolve to the same file always produce equal ids, which is what deduplicates
/// shared dependencies and stops reprocessing around cycles. The same string is
/// used as the registration and cache key inside the emitted bundle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The file this id denotes
    pub fn path(&self) -> &Path {
        Path::new(&*self.0)
    }

    /// Directory that relative specifiers inside this module are resolved against
    pub fn directory(&self) -> &Path {
        self.path().parent().unwrap_or_else(|| Path::new("/"))
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How a discovered file is turned into a module body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// JavaScript using the synchronous `require()` convention
    Script,

    /// JSON document, exported as the module's value
    Json,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Script,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Json => write!(f, "json"),
        }
    }
}
