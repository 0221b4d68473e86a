//! Code generation for the single-file bundle
//!
//! This module implements the final synthesis step:
//! - Wraps each rewritten module body in a registration function taking
//!   `(require, exports, module)`
//! - Splices the registrations into a fixed runtime skeleton holding the
//!   registration table, the module cache and the loader routine
//! - Boots the entry module and wraps everything in an IIFE so the bundle
//!   introduces no global bindings

mod emitter;
mod runtime;
mod template;

pub use emitter::BundleEmitter;
pub use runtime::RuntimeMode;
