//! Error taxonomy for a bundling run
//!
//! Every variant is fatal: the build is all-or-nothing, so nothing here is ever
//! retried or downgraded to a warning.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ModuleId;

pub type Result<T, E = BundleError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BundleError {
    /// An import specifier does not denote any file reachable from the importer
    #[error("cannot resolve '{specifier}' from {}: {reason}", .from_dir.display())]
    Resolution {
        specifier: String,
        from_dir: PathBuf,
        reason: String,
    },

    /// An import call whose argument is not a literal string
    #[error("unsupported {callee}() call in {importer}: {detail}")]
    UnsupportedImport {
        importer: ModuleId,
        callee: String,
        detail: String,
    },

    /// Malformed source in a discovered file
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised only when strict cycle checking is enabled
    #[error("circular dependency between modules: {}", format_cycle(.cycle))]
    CircularDependency { cycle: Vec<ModuleId> },

    /// Broken internal invariant, e.g. a registration for a module absent from
    /// the table; a logic fault rather than a user error
    #[error("internal invariant violated: {0}")]
    Internal(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BundleError {
    pub(crate) fn resolution(
        specifier: &str,
        from_dir: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            specifier: specifier.to_owned(),
            from_dir: from_dir.into(),
            reason: reason.into(),
        }
    }
}

fn format_cycle(cycle: &[ModuleId]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(ModuleId::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}
