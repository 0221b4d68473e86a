//! Module resolution: import specifier plus importer directory to canonical id
//!
//! Relative and absolute specifiers are probed as a file, then as a directory.
//! Package specifiers are looked up in `node_modules` of every ancestor. Results
//! are cached per resolver, keyed by directory and specifier.

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::{
    config::Config,
    error::{BundleError, Result},
    types::ModuleId,
};

/// Directory searched in every ancestor for package-style specifiers
const PACKAGES_DIR: &str = "node_modules";
const PACKAGE_MANIFEST: &str = "package.json";

/// How a specifier is looked up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `./x`, `../x`, `.`, `..`: joined onto the importer's directory
    Relative,
    /// `/abs/x`: used as-is
    Absolute,
    /// `pkg` or `pkg/sub`: searched for in `node_modules` directories
    Package,
}

impl SpecifierKind {
    pub fn classify(specifier: &str) -> Self {
        if specifier == "."
            || specifier == ".."
            || specifier.starts_with("./")
            || specifier.starts_with("../")
        {
            Self::Relative
        } else if Path::new(specifier).is_absolute() {
            Self::Absolute
        } else {
            Self::Package
        }
    }
}

/// The subset of `package.json` consulted when a specifier names a directory
#[derive(Debug, Default, Deserialize)]
struct PackageManifest {
    main: Option<String>,
}

/// Maps import specifiers to canonical module ids
#[derive(Debug)]
pub struct ModuleResolver {
    /// Extensions appended, in order, to extension-less candidates
    extensions: Vec<String>,
    /// Cache of resolved ids keyed by importer directory and specifier
    cache: FxHashMap<(PathBuf, String), ModuleId>,
}

impl ModuleResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            extensions: config.extensions.clone(),
            cache: FxHashMap::default(),
        }
    }

    /// Resolve the entry file given on the command line
    ///
    /// The entry path is taken relative to the working directory unless absolute.
    pub fn resolve_entry(&mut self, entry: &Path) -> Result<ModuleId> {
        let candidate = if entry.is_absolute() {
            entry.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|source| BundleError::Io {
                    path: entry.to_path_buf(),
                    source,
                })?
                .join(entry)
        };
        let from_dir = candidate.parent().unwrap_or(Path::new("/")).to_path_buf();
        let specifier = entry.to_string_lossy();

        self.resolve_candidate(&candidate)
            .ok_or_else(|| BundleError::resolution(&specifier, from_dir, "entry file not found"))
            .and_then(|path| to_module_id(&path, &specifier, candidate.parent()))
    }

    /// Resolve `specifier` as written in a module located in `from_dir`
    pub fn resolve(&mut self, specifier: &str, from_dir: &Path) -> Result<ModuleId> {
        if specifier.is_empty() {
            return Err(BundleError::resolution(
                specifier,
                from_dir,
                "empty specifier",
            ));
        }

        let key = (from_dir.to_path_buf(), specifier.to_owned());
        if let Some(cached) = self.cache.get(&key) {
            trace!("Resolver cache hit for '{specifier}' in {}", from_dir.display());
            return Ok(cached.clone());
        }

        let kind = SpecifierKind::classify(specifier);
        let resolved = match kind {
            SpecifierKind::Relative | SpecifierKind::Absolute => {
                self.resolve_candidate(&from_dir.join(specifier))
            }
            SpecifierKind::Package => self.resolve_package(specifier, from_dir),
        };

        let Some(path) = resolved else {
            let reason = match kind {
                SpecifierKind::Package => format!(
                    "no matching file or package in any {PACKAGES_DIR} directory"
                ),
                _ => "no such file".to_owned(),
            };
            return Err(BundleError::resolution(specifier, from_dir, reason));
        };

        let id = to_module_id(&path, specifier, Some(from_dir))?;
        debug!("Resolved '{specifier}' from {} to {id}", from_dir.display());
        self.cache.insert(key, id.clone());
        Ok(id)
    }

    /// Try `candidate` as a file, then as a directory
    fn resolve_candidate(&self, candidate: &Path) -> Option<PathBuf> {
        self.resolve_as_file(candidate)
            .or_else(|| self.resolve_as_directory(candidate))
    }

    fn resolve_as_file(&self, candidate: &Path) -> Option<PathBuf> {
        if candidate.is_file() {
            return Some(candidate.to_path_buf());
        }

        // Extensions are appended, not substituted: `app.config` -> `app.config.js`
        self.extensions.iter().find_map(|ext| {
            let mut with_ext = OsString::from(candidate.as_os_str());
            with_ext.push(".");
            with_ext.push(ext);
            let path = PathBuf::from(with_ext);
            path.is_file().then_some(path)
        })
    }

    fn resolve_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }

        if let Some(main) = read_manifest_main(&dir.join(PACKAGE_MANIFEST)) {
            let main_path = dir.join(main);
            if let Some(found) = self
                .resolve_as_file(&main_path)
                .or_else(|| self.resolve_index(&main_path))
            {
                return Some(found);
            }
        }

        self.resolve_index(dir)
    }

    fn resolve_index(&self, dir: &Path) -> Option<PathBuf> {
        self.extensions.iter().find_map(|ext| {
            let path = dir.join(format!("index.{ext}"));
            path.is_file().then_some(path)
        })
    }

    /// Walk from `from_dir` up to the filesystem root looking in each `node_modules`
    fn resolve_package(&self, specifier: &str, from_dir: &Path) -> Option<PathBuf> {
        from_dir
            .ancestors()
            .filter(|dir| dir.file_name().is_none_or(|name| name != PACKAGES_DIR))
            .find_map(|dir| {
                let candidate = dir.join(PACKAGES_DIR).join(specifier);
                self.resolve_candidate(&candidate)
            })
    }
}

fn read_manifest_main(manifest: &Path) -> Option<String> {
    let text = fs::read_to_string(manifest).ok()?;
    match serde_json::from_str::<PackageManifest>(&text) {
        Ok(parsed) => parsed.main.filter(|main| !main.is_empty()),
        Err(e) => {
            debug!("Ignoring unreadable manifest {}: {e}", manifest.display());
            None
        }
    }
}

/// Canonicalize a found file into its module id
fn to_module_id(path: &Path, specifier: &str, from_dir: Option<&Path>) -> Result<ModuleId> {
    let from_dir = from_dir.unwrap_or(Path::new("/"));
    let canonical = path.canonicalize().map_err(|e| {
        BundleError::resolution(
            specifier,
            from_dir,
            format!("cannot canonicalize {}: {e}", path.display()),
        )
    })?;
    let id = canonical.to_str().ok_or_else(|| {
        BundleError::resolution(
            specifier,
            from_dir,
            format!("path {} is not valid UTF-8", canonical.display()),
        )
    })?;
    Ok(ModuleId::new(id))
}
