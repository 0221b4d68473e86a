//! Graph builder that discovers every module reachable from the entry file
//!
//! Discovery is an explicit worklist loop, never recursion, so arbitrarily deep or
//! cyclic graphs cannot grow the call stack. All discovery state is local to one
//! `build` call; nothing is shared between builds.
use std::{fs, path::Path};

use indexmap::IndexSet;
use log::{debug, info, trace};
use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;
use oxc_ast_visit::VisitMut;
use rustc_hash::FxHashSet;

use crate::{
    config::Config,
    error::{BundleError, Result},
    module_table::{ModuleRecord, ModuleTable},
    parse,
    resolver::ModuleResolver,
    types::{ModuleId, SourceKind},
    visitors::RequireRewriter,
};

/// Last-in-first-out collection of modules awaiting processing
///
/// An id is accepted at most once over the lifetime of the list, even if it was
/// already popped, so every module is read and parsed exactly once.
#[derive(Debug, Default)]
pub struct WorkList {
    stack: Vec<ModuleId>,
    pushed: FxHashSet<ModuleId>,
}

impl WorkList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `id`; returns `false` if it was queued before
    pub fn push(&mut self, id: ModuleId) -> bool {
        if !self.pushed.insert(id.clone()) {
            return false;
        }
        self.stack.push(id);
        true
    }

    pub fn pop(&mut self) -> Option<ModuleId> {
        self.stack.pop()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

/// Builds a [`ModuleTable`] from an entry file
pub struct GraphBuilder<'a, 'c> {
    allocator: &'a Allocator,
    config: &'c Config,
    resolver: ModuleResolver,
}

impl<'a, 'c> GraphBuilder<'a, 'c> {
    /// Trees produced by the build live in `allocator`
    pub fn new(allocator: &'a Allocator, config: &'c Config) -> Self {
        Self {
            allocator,
            config,
            resolver: ModuleResolver::new(config),
        }
    }

    /// Discover, parse and rewrite every module reachable from `entry`
    ///
    /// Returns the finished table and the entry module's id. Any resolution,
    /// unsupported-import, read or parse failure aborts the whole build.
    pub fn build(&mut self, entry: &Path) -> Result<(ModuleTable<'a>, ModuleId)> {
        let entry_id = self.resolver.resolve_entry(entry)?;
        info!("Bundling from entry {entry_id}");

        let mut table = ModuleTable::new();
        let mut worklist = WorkList::new();
        worklist.push(entry_id.clone());

        while let Some(id) = worklist.pop() {
            let record = self.process_module(id, &mut worklist)?;
            table.insert(record).map_err(|record| {
                BundleError::Internal(format!("module {} was processed twice", record.id))
            })?;
        }

        info!(
            "Discovered {} modules ({} bytes of source)",
            table.len(),
            table.total_source_len()
        );
        Ok((table, entry_id))
    }

    /// Read, parse and rewrite one module, queueing dependencies not seen before
    fn process_module(
        &mut self,
        id: ModuleId,
        worklist: &mut WorkList,
    ) -> Result<ModuleRecord<'a>> {
        let source = fs::read_to_string(id.path()).map_err(|source| BundleError::Io {
            path: id.path().to_path_buf(),
            source,
        })?;
        let kind = SourceKind::from_path(id.path());
        debug!("Processing {kind} module {id} ({} bytes)", source.len());

        let mut body = parse::parse_module(self.allocator, id.path(), &source, kind)?;

        let mut rewriter = RequireRewriter::new(
            AstBuilder::new(self.allocator),
            &mut self.resolver,
            &id,
            &self.config.require_name,
        );
        rewriter.visit_program(&mut body);
        let dependencies: IndexSet<ModuleId> = rewriter.finish()?.into_iter().collect();

        for dependency in &dependencies {
            if worklist.push(dependency.clone()) {
                trace!("Queued {dependency} (required by {id})");
            }
        }

        Ok(ModuleRecord {
            id,
            body,
            kind,
            dependencies: dependencies.into_iter().collect(),
            source_len: source.len(),
        })
    }
}

impl std::fmt::Debug for GraphBuilder<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphBuilder")
            .field("config", self.config)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
