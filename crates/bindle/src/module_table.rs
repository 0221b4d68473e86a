//! Module table for tracking discovered modules during bundling
//!
//! The table is the single owner of every rewritten tree. Iteration follows
//! insertion order, which is the order modules finished processing, so bundles
//! built from an unchanged file tree are byte-identical.

use indexmap::IndexMap;
use oxc_ast::ast::Program;
use rustc_hash::FxHasher;

use crate::types::{ModuleId, SourceKind};

/// Type alias for FxHasher-based IndexMap
type FxIndexMap<K, V> = IndexMap<K, V, std::hash::BuildHasherDefault<FxHasher>>;

/// One discovered source file
#[derive(Debug)]
pub struct ModuleRecord<'a> {
    pub id: ModuleId,
    /// Parsed tree with every import call site already rewritten
    pub body: Program<'a>,
    pub kind: SourceKind,
    /// Distinct dependencies in first-call order
    pub dependencies: Vec<ModuleId>,
    /// Size of the source file in bytes
    pub source_len: usize,
}

#[derive(Debug, Default)]
pub struct ModuleTable<'a> {
    modules: FxIndexMap<ModuleId, ModuleRecord<'a>>,
}

impl<'a> ModuleTable<'a> {
    pub fn new() -> Self {
        Self {
            modules: FxIndexMap::default(),
        }
    }

    /// Add a finished record
    ///
    /// Records are never replaced; a second insert for the same id is refused and
    /// the offered record handed back.
    pub fn insert(&mut self, record: ModuleRecord<'a>) -> Result<(), ModuleRecord<'a>> {
        if self.modules.contains_key(&record.id) {
            return Err(record);
        }
        self.modules.insert(record.id.clone(), record);
        Ok(())
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.modules.contains_key(id)
    }

    pub fn get(&self, id: &ModuleId) -> Option<&ModuleRecord<'a>> {
        self.modules.get(id)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Records in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleRecord<'a>> {
        self.modules.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ModuleId> {
        self.modules.keys()
    }

    pub fn total_source_len(&self) -> usize {
        self.iter().map(|record| record.source_len).sum()
    }
}
