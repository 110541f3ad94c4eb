// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Export discovery: turns function exports into host function objects

use crate::{FunctionBinding, LoadedModule, LoaderError, LoaderResult, ResolvedExport, TypeTable};
use dotwasm_reflect::{Function, Scope, Value};
use serde::Serialize;
use tracing::{debug, error, warn};
use wasmi::{ExternType, FuncType};

/// Per-export outcome counts of a discovery pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryReport {
    /// Functions defined in the target scope
    pub defined: usize,
    /// Globals, memories and tables, which are not exposed
    pub skipped: usize,
    /// Function exports that could not be defined
    pub failed: usize,
}

impl DiscoveryReport {
    pub fn merge(&mut self, other: DiscoveryReport) {
        self.defined += other.defined;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Discover every export of `module` into `scope`.
///
/// Failures are isolated to the export they occur in and never stop the walk.
pub fn discover_module(types: &TypeTable, module: &LoadedModule, scope: &mut Scope) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for export in module.exports() {
        match export.ty() {
            ExternType::Func(func_type) => match discover_function(types, module, export, func_type, scope) {
                Ok(()) => report.defined += 1,
                Err(e) => {
                    error!("Failed to discover function {} in module {}: {}", export.name(), module.name(), e);
                    report.failed += 1;
                }
            },
            _ => {
                debug!("Skipping {} export {} in module {}", export.kind_name(), export.name(), module.name());
                report.skipped += 1;
            }
        }
    }

    report
}

/// Build a host function for one function export and define it in `scope`
pub fn discover_function(types: &TypeTable, module: &LoadedModule, export: &ResolvedExport, func_type: &FuncType, scope: &mut Scope) -> LoaderResult<()> {
    let params = func_type.params();
    let results = func_type.results();

    let func = export.value().into_func().ok_or_else(|| LoaderError::unsupported(format!("export {} is typed as a function but is not one", export.name())))?;
    let binding = FunctionBinding::new(func, module.liveness(), module.name(), export.name());

    let mut function = Function::create(export.name(), params.len(), Box::new(binding))?;
    let signature = function.signature_mut();

    if let Some(first) = results.first() {
        if results.len() > 1 {
            warn!("WebAssembly loader does not support multiple return values yet, using first return value of {} ({} results)", export.name(), results.len());
        }
        signature.set_return(types.map_value_kind(*first)?);
    }

    // Export signatures carry no parameter names
    for (index, kind) in params.iter().enumerate() {
        signature.set(index, "", types.map_value_kind(*kind)?)?;
    }

    scope.define(export.name(), Value::function(function))?;
    Ok(())
}
