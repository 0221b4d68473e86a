//! The loader embedded in every bundle
//!
//! Two flavours exist. Both keep a registration table and a cache, both use
//! null-prototype objects with an `in` test so falsy exports still count as
//! loaded, and both expose nothing outside the wrapping IIFE.
//!
//! * [`RuntimeMode::Reentrant`] writes the cache entry after the module body has
//!   returned. A require cycle therefore re-enters the first module's body and
//!   recurses until the engine's stack overflows.
//! * [`RuntimeMode::CycleSafe`] caches the module descriptor before running the
//!   body. A reentrant request returns the in-progress `exports` object instead of
//!   running the body again.

use std::{fmt, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::BundleError;

/// Binding that holds the registration table inside the bundle
pub(crate) const MODULES_BINDING: &str = "__bindle_modules__";
/// Binding that holds the loaded-module cache inside the bundle
pub(crate) const CACHE_BINDING: &str = "__bindle_cache__";
/// The loader routine inside the bundle
pub(crate) const LOADER_BINDING: &str = "__bindle_require__";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RuntimeMode {
    /// Cache exports after the body returns; cycles recurse without bound
    #[default]
    Reentrant,
    /// Cache the descriptor before the body runs; cycles see partial exports
    CycleSafe,
}

impl RuntimeMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reentrant => "reentrant",
            Self::CycleSafe => "cycle-safe",
        }
    }

    /// Source of the loader routine for this mode
    pub(crate) fn loader_source(self) -> String {
        let body = match self {
            Self::Reentrant => format!(
                "  if (!(moduleId in {CACHE_BINDING})) {{\n\
                 \x20   var module = {{ exports: {{}} }};\n\
                 \x20   {MODULES_BINDING}[moduleId]({LOADER_BINDING}, module.exports, module);\n\
                 \x20   {CACHE_BINDING}[moduleId] = module.exports;\n\
                 \x20 }}\n\
                 \x20 return {CACHE_BINDING}[moduleId];\n"
            ),
            Self::CycleSafe => format!(
                "  if (!(moduleId in {CACHE_BINDING})) {{\n\
                 \x20   var module = {{ exports: {{}} }};\n\
                 \x20   {CACHE_BINDING}[moduleId] = module;\n\
                 \x20   {MODULES_BINDING}[moduleId]({LOADER_BINDING}, module.exports, module);\n\
                 \x20 }}\n\
                 \x20 return {CACHE_BINDING}[moduleId].exports;\n"
            ),
        };
        format!("function {LOADER_BINDING}(moduleId) {{\n{body}}}\n")
    }
}

impl fmt::Display for RuntimeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuntimeMode {
    type Err = BundleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reentrant" => Ok(Self::Reentrant),
            "cycle-safe" => Ok(Self::CycleSafe),
            other => Err(BundleError::Config(format!(
                "unknown runtime '{other}', expected 'reentrant' or 'cycle-safe'"
            ))),
        }
    }
}

/// Skeleton of the whole bundle
///
/// `{{MODULES}}` receives the registration fragments, `{{LOADER}}` the loader
/// routine and `{{ENTRY}}` the quoted entry id.
pub(crate) fn bundle_skeleton() -> String {
    format!(
        "(function () {{\n\
         var {MODULES_BINDING} = Object.create(null);\n\
         {{{{MODULES}}}}\n\
         var {CACHE_BINDING} = Object.create(null);\n\
         {{{{LOADER}}}}\n\
         {LOADER_BINDING}({{{{ENTRY}}}});\n\
         }})();\n"
    )
}

/// Skeleton of one registration fragment
///
/// `{{ID}}` receives the quoted module id, `{{REQUIRE}}` the import function name
/// and `{{BODY}}` the module's rewritten source.
pub(crate) fn registration_skeleton() -> String {
    format!(
        "{MODULES_BINDING}[{{{{ID}}}}] = function ({{{{REQUIRE}}}}, exports, module) {{\n\
         {{{{BODY}}}}\n\
         }};\n"
    )
}
