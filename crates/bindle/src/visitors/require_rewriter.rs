//! Call-site visitor that finds every `require()` in a module, resolves its
//! specifier and rewrites the literal argument in place to the canonical id.

use log::trace;
use oxc_ast::{
    AstBuilder,
    ast::{Argument, CallExpression, Expression},
};
use oxc_ast_visit::{VisitMut, walk_mut};

use crate::{
    error::{BundleError, Result},
    resolver::ModuleResolver,
    types::ModuleId,
};

/// Rewrites import call sites of one module
///
/// Traversal continues into nested functions and callbacks, so imports inside
/// function bodies are discovered as well. The first failure stops further
/// resolution and is reported by [`RequireRewriter::finish`].
pub struct RequireRewriter<'a, 'r> {
    ast: AstBuilder<'a>,
    resolver: &'r mut ModuleResolver,
    importer: &'r ModuleId,
    require_name: &'r str,
    /// Resolved dependencies in call-site order, one entry per call
    dependencies: Vec<ModuleId>,
    error: Option<BundleError>,
}

impl<'a, 'r> RequireRewriter<'a, 'r> {
    pub fn new(
        ast: AstBuilder<'a>,
        resolver: &'r mut ModuleResolver,
        importer: &'r ModuleId,
        require_name: &'r str,
    ) -> Self {
        Self {
            ast,
            resolver,
            importer,
            require_name,
            dependencies: Vec::new(),
            error: None,
        }
    }

    /// Dependencies found by the traversal, or the first error hit
    pub fn finish(self) -> Result<Vec<ModuleId>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.dependencies),
        }
    }

    fn is_require_call(&self, call: &CallExpression<'a>) -> bool {
        matches!(&call.callee, Expression::Identifier(ident) if ident.name.as_str() == self.require_name)
    }

    fn unsupported(&self, detail: impl Into<String>) -> BundleError {
        BundleError::UnsupportedImport {
            importer: self.importer.clone(),
            callee: self.require_name.to_owned(),
            detail: detail.into(),
        }
    }

    fn rewrite_call(&mut self, call: &mut CallExpression<'a>) -> Result<()> {
        let ast = self.ast;
        let Some(first) = call.arguments.first_mut() else {
            return Err(self.unsupported("call has no arguments"));
        };

        let Argument::StringLiteral(literal) = first else {
            let detail = match first {
                Argument::SpreadElement(_) => "argument is a spread element".to_owned(),
                Argument::TemplateLiteral(_) => {
                    "argument is a template literal, not a string literal".to_owned()
                }
                _ => "argument is not a string literal".to_owned(),
            };
            return Err(self.unsupported(detail));
        };

        let specifier = literal.value.as_str().to_owned();
        let dependency = self
            .resolver
            .resolve(&specifier, self.importer.directory())?;
        trace!(
            "Rewriting {}('{specifier}') in {} to {dependency}",
            self.require_name, self.importer
        );

        literal.value = ast.atom(dependency.as_str());
        literal.raw = None;
        self.dependencies.push(dependency);
        Ok(())
    }
}

impl<'a> VisitMut<'a> for RequireRewriter<'a, '_> {
    fn visit_call_expression(&mut self, it: &mut CallExpression<'a>) {
        if self.error.is_some() {
            return;
        }

        // Arguments may themselves contain import calls: `require('./a')(require('./b'))`
        walk_mut::walk_call_expression(self, it);

        if self.error.is_none()
            && self.is_require_call(it)
            && let Err(error) = self.rewrite_call(it)
        {
            self.error = Some(error);
        }
    }
}

impl std::fmt::Debug for RequireRewriter<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequireRewriter")
            .field("importer", self.importer)
            .field("require_name", &self.require_name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}
