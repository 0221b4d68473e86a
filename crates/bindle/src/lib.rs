//! bindle: a CommonJS bundler
//!
//! Starting from an entry file, bindle discovers every module reachable through
//! literal `require()` calls, rewrites each call to a canonical module id, and
//! emits one self-contained program with an embedded loader that executes each
//! module once and caches its exports.

pub mod code_generator;
pub mod config;
pub mod dependency_graph;
pub mod error;
pub mod graph_builder;
pub mod module_table;
pub mod orchestrator;
pub mod parse;
pub mod resolver;
pub mod types;
pub mod visitors;

pub use code_generator::{BundleEmitter, RuntimeMode};
pub use config::Config;
pub use error::BundleError;
pub use orchestrator::BundleOrchestrator;
pub use types::ModuleId;
