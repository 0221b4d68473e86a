//! Module-level dependency graph used for cycle diagnostics
//!
//! The bundle itself does not need the graph: registration order is discovery
//! order. The graph exists to tell the operator, before the bundle runs, which
//! modules require each other circularly.
use log::debug;
use petgraph::{
    algo::{is_cyclic_directed, tarjan_scc},
    graph::{DiGraph, NodeIndex},
};
use rustc_hash::FxHashMap;

use crate::{module_table::ModuleTable, types::ModuleId};

#[derive(Debug)]
pub struct DependencyGraph {
    /// Edges point from importer to dependency
    graph: DiGraph<ModuleId, ()>,
}

impl DependencyGraph {
    pub fn from_table(table: &ModuleTable<'_>) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices: FxHashMap<ModuleId, NodeIndex> = FxHashMap::default();

        for id in table.ids() {
            let node = graph.add_node(id.clone());
            node_indices.insert(id.clone(), node);
        }

        for record in table.iter() {
            let from = node_indices[&record.id];
            for dependency in &record.dependencies {
                if let Some(&to) = node_indices.get(dependency)
                    && !graph.contains_edge(from, to)
                {
                    graph.add_edge(from, to, ());
                }
            }
        }

        debug!(
            "Dependency graph has {} modules and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Self { graph }
    }

    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Every group of modules that require each other, including self-requires
    ///
    /// Members of each group are sorted and the groups are ordered by their first
    /// member so diagnostics are stable across runs.
    pub fn find_cycles(&self) -> Vec<Vec<ModuleId>> {
        let mut cycles: Vec<Vec<ModuleId>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&node| self.graph.contains_edge(node, node))
            })
            .map(|component| {
                let mut ids: Vec<ModuleId> = component
                    .into_iter()
                    .map(|idx| self.graph[idx].clone())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }
}
