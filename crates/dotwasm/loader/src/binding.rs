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

//! Host function implementation backed by a WASM function export

use dotwasm_reflect::{Function, FunctionInterface, ReflectError, ReflectResult, RejectCallback, ResolveCallback, Signature, Value};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use wasmi::Func;

/// Wraps a WASM function value owned by a loaded module.
///
/// The binding never owns the function: it holds a store-relative reference
/// plus a weak token of the module, and reports itself detached once the
/// module has been unloaded.
#[derive(Debug, Clone)]
pub struct FunctionBinding {
    func: Func,
    module: String,
    export: String,
    liveness: Weak<()>,
}

impl FunctionBinding {
    pub fn new(func: Func, liveness: &Arc<()>, module: impl Into<String>, export: impl Into<String>) -> Self {
        Self { func, module: module.into(), export: export.into(), liveness: Arc::downgrade(liveness) }
    }

    pub fn func(&self) -> Func {
        self.func
    }

    /// Whether the module owning the function is still loaded
    pub fn is_attached(&self) -> bool {
        self.liveness.strong_count() > 0
    }

    fn unavailable(&self, operation: &str) -> ReflectError {
        if !self.is_attached() {
            return ReflectError::invocation(format!("{}::{} belongs to an unloaded module", self.module, self.export));
        }
        ReflectError::not_implemented(format!("{operation} of WebAssembly function {}::{}", self.module, self.export))
    }
}

impl FunctionInterface for FunctionBinding {
    fn create(&mut self, name: &str, signature: &Signature) -> ReflectResult<()> {
        debug!("Binding WebAssembly function {}::{} as {} with {} parameters", self.module, self.export, name, signature.arity());
        Ok(())
    }

    fn invoke(&self, _function: &Function, _args: &[Value]) -> ReflectResult<Value> {
        Err(self.unavailable("invoke"))
    }

    fn await_call(&self, _function: &Function, _args: &[Value], _resolve: ResolveCallback, _reject: RejectCallback) -> ReflectResult<Value> {
        Err(self.unavailable("await"))
    }

    fn destroy(&mut self) {
        trace!("Released binding for {}::{}", self.module, self.export);
    }
}
