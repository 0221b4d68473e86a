//! AST visitor implementations for bindle
//!
//! This module contains the mutable visitors run over each parsed module while the
//! dependency graph is discovered.

mod require_rewriter;

pub use require_rewriter::RequireRewriter;
