//! Drives one bundling run from entry file to output text
//!
//! Each call builds its own arena, module table and resolver cache, so several
//! bundles can be produced by one process without sharing state.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use log::{info, warn};
use oxc_allocator::Allocator;

use crate::{
    code_generator::{BundleEmitter, RuntimeMode},
    config::Config,
    dependency_graph::DependencyGraph,
    error::BundleError,
    graph_builder::GraphBuilder,
    module_table::ModuleTable,
};

#[derive(Debug, Clone)]
pub struct BundleOrchestrator {
    config: Config,
}

impl BundleOrchestrator {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Bundle `entry` and return the generated source
    pub fn bundle(&self, entry: &Path) -> Result<String> {
        self.config.validate()?;

        let allocator = Allocator::default();
        let (table, entry_id) = GraphBuilder::new(&allocator, &self.config)
            .build(entry)
            .with_context(|| format!("failed to build module graph for {}", entry.display()))?;

        self.check_cycles(&table)?;

        let emitter = BundleEmitter::new(self.config.runtime, self.config.require_name.as_str());
        let output = emitter
            .emit(&table, &entry_id)
            .context("failed to emit bundle")?;

        info!(
            "Bundled {} modules into {} bytes",
            table.len(),
            output.len()
        );
        Ok(output)
    }

    /// Bundle `entry` into `output`, creating parent directories as needed
    ///
    /// Nothing is written unless the whole bundle was produced.
    pub fn bundle_to_file(&self, entry: &Path, output: &Path) -> Result<()> {
        let code = self.bundle(entry)?;

        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(output, code)
            .with_context(|| format!("failed to write bundle to {}", output.display()))?;
        info!("Wrote bundle to {}", output.display());
        Ok(())
    }

    /// Report require cycles; fatal when strict cycle checking is on
    fn check_cycles(&self, table: &ModuleTable<'_>) -> Result<()> {
        let graph = DependencyGraph::from_table(table);
        if !graph.has_cycles() {
            return Ok(());
        }
        let cycles = graph.find_cycles();

        if self.config.strict_cycles
            && let Some(cycle) = cycles.first()
        {
            return Err(BundleError::CircularDependency {
                cycle: cycle.clone(),
            }
            .into());
        }

        for cycle in &cycles {
            let members = cycle
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            match self.config.runtime {
                RuntimeMode::Reentrant => warn!(
                    "Circular require between [{members}]: the reentrant runtime will recurse \
                     without bound if these modules require each other while loading; use the \
                     cycle-safe runtime to get partial exports instead"
                ),
                RuntimeMode::CycleSafe => info!(
                    "Circular require between [{members}]: reentrant loads will see partially \
                     populated exports"
                ),
            }
        }
        Ok(())
    }
}
