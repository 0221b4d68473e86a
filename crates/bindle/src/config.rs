//! Layered configuration for bundling runs
//!
//! Precedence, lowest first: built-in defaults, the user config file
//! (`<config dir>/bindle/bindle.toml`), the project config file (`bindle.toml` in
//! the working directory or an explicit path), `BINDLE_*` environment variables,
//! and finally command line flags applied by the binary.

use std::{
    fs,
    path::{Path, PathBuf},
};

use etcetera::{BaseStrategy, choose_base_strategy};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    code_generator::RuntimeMode,
    error::{BundleError, Result},
};

pub const CONFIG_FILE_NAME: &str = "bindle.toml";

const ENV_REQUIRE_NAME: &str = "BINDLE_REQUIRE_NAME";
const ENV_RUNTIME: &str = "BINDLE_RUNTIME";

/// The other parameters of every registration function
const RESERVED_PARAMETERS: [&str; 2] = ["exports", "module"];

/// Words that cannot name a function parameter, including strict-mode reservations
const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Name of the synchronous import function whose call sites are rewritten
    pub require_name: String,
    /// Extensions tried, in order, when a specifier names a file without one
    pub extensions: Vec<String>,
    /// Loader flavour embedded in the emitted bundle
    pub runtime: RuntimeMode,
    /// Fail the build when the module graph contains a cycle
    pub strict_cycles: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            require_name: "require".to_owned(),
            extensions: vec!["js".to_owned(), "json".to_owned(), "cjs".to_owned()],
            runtime: RuntimeMode::default(),
            strict_cycles: false,
        }
    }
}

/// A config file as written on disk: every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    require_name: Option<String>,
    extensions: Option<Vec<String>>,
    runtime: Option<RuntimeMode>,
    strict_cycles: Option<bool>,
}

impl Config {
    /// Load the full configuration stack
    ///
    /// An explicit path must exist; the implicit user and project files are
    /// skipped when absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config) = user_config_path()
            && user_config.is_file()
        {
            config.merge_file(&user_config)?;
        }

        match explicit {
            Some(path) => config.merge_file(path)?,
            None => {
                let project_config = PathBuf::from(CONFIG_FILE_NAME);
                if project_config.is_file() {
                    config.merge_file(&project_config)?;
                }
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the keys present in a TOML file
    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|source| BundleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_str(&text)
            .map_err(|e| BundleError::Config(format!("{}: {e}", path.display())))?;
        debug!("Merged configuration from {}", path.display());
        Ok(())
    }

    /// Overlay the keys present in a TOML document
    pub fn merge_str(&mut self, text: &str) -> Result<()> {
        let partial: PartialConfig =
            toml::from_str(text).map_err(|e| BundleError::Config(e.to_string()))?;

        if let Some(require_name) = partial.require_name {
            self.require_name = require_name;
        }
        if let Some(extensions) = partial.extensions {
            self.extensions = extensions;
        }
        if let Some(runtime) = partial.runtime {
            self.runtime = runtime;
        }
        if let Some(strict_cycles) = partial.strict_cycles {
            self.strict_cycles = strict_cycles;
        }
        Ok(())
    }

    /// Apply `BINDLE_*` overrides read through `lookup`
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(require_name) = lookup(ENV_REQUIRE_NAME) {
            self.require_name = require_name;
        }
        if let Some(runtime) = lookup(ENV_RUNTIME) {
            self.runtime = runtime.parse()?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.require_name) {
            return Err(BundleError::Config(format!(
                "require_name '{}' is not a valid identifier",
                self.require_name
            )));
        }
        if RESERVED_WORDS.contains(&self.require_name.as_str()) {
            return Err(BundleError::Config(format!(
                "require_name '{}' is a reserved word",
                self.require_name
            )));
        }
        if RESERVED_PARAMETERS.contains(&self.require_name.as_str()) {
            return Err(BundleError::Config(format!(
                "require_name '{}' collides with a registration function parameter",
                self.require_name
            )));
        }
        if let Some(ext) = self
            .extensions
            .iter()
            .find(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(BundleError::Config(format!(
                "extension '{ext}' must be non-empty and written without a leading dot"
            )));
        }
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    let strategy = choose_base_strategy().ok()?;
    Some(strategy.config_dir().join("bindle").join(CONFIG_FILE_NAME))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
