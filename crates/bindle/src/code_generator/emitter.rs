use log::{debug, trace};
use oxc_allocator::Allocator;

use super::{
    runtime::{self, RuntimeMode},
    template,
};
use crate::{
    error::{BundleError, Result},
    module_table::ModuleTable,
    parse,
    types::ModuleId,
};

/// Synthesizes the single-file program from a finished module table
#[derive(Debug, Clone)]
pub struct BundleEmitter {
    runtime: RuntimeMode,
    require_name: String,
}

impl BundleEmitter {
    pub fn new(runtime: RuntimeMode, require_name: impl Into<String>) -> Self {
        Self {
            runtime,
            require_name: require_name.into(),
        }
    }

    /// Produce bundle source for `table`, booting `entry`
    ///
    /// Registrations appear in table order. Emission touches neither the
    /// filesystem nor the network; its only failures are invariant violations.
    pub fn emit(&self, table: &ModuleTable<'_>, entry: &ModuleId) -> Result<String> {
        check_invariants(table, entry)?;

        let registration_skeleton = runtime::registration_skeleton();
        let mut registrations = String::new();
        for record in table.iter() {
            let id = quote(&record.id)?;
            let body = parse::print(&record.body);
            trace!("Registering {} ({} bytes generated)", record.id, body.len());
            registrations.push_str(&template::render(
                &registration_skeleton,
                &[
                    ("ID", id.as_str()),
                    ("REQUIRE", self.require_name.as_str()),
                    ("BODY", body.as_str()),
                ],
            )?);
        }

        let loader = self.runtime.loader_source();
        let entry_literal = quote(entry)?;
        let spliced = template::render(
            &runtime::bundle_skeleton(),
            &[
                ("MODULES", registrations.as_str()),
                ("LOADER", loader.as_str()),
                ("ENTRY", entry_literal.as_str()),
            ],
        )?;

        let output = reformat(&spliced)?;
        debug!(
            "Emitted {} modules with the {} runtime ({} bytes)",
            table.len(),
            self.runtime,
            output.len()
        );
        Ok(output)
    }
}

/// Every registration and every rewritten reference must name a module in the table
fn check_invariants(table: &ModuleTable<'_>, entry: &ModuleId) -> Result<()> {
    if !table.contains(entry) {
        return Err(BundleError::Internal(format!(
            "entry module {entry} is not in the module table"
        )));
    }
    for record in table.iter() {
        if let Some(missing) = record.dependencies.iter().find(|dep| !table.contains(dep)) {
            return Err(BundleError::Internal(format!(
                "module {} requires {missing}, which is not in the module table",
                record.id
            )));
        }
    }
    Ok(())
}

/// A module id as a JavaScript string literal
fn quote(id: &ModuleId) -> Result<String> {
    serde_json::to_string(id.as_str())
        .map_err(|e| BundleError::Internal(format!("cannot quote module id {id}: {e}")))
}

/// Parse the spliced bundle and print it again
///
/// A splice that does not parse means a fragment or the skeleton is broken.
fn reformat(spliced: &str) -> Result<String> {
    let allocator = Allocator::default();
    let text = allocator.alloc_str(spliced);
    let program = parse::parse_script(&allocator, text)
        .map_err(|message| BundleError::Internal(format!("spliced bundle does not parse: {message}")))?;
    Ok(parse::print(&program))
}
