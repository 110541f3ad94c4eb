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

//! Loader façade: the entry points a host driver calls

use crate::discovery::discover_module;
use crate::{DiscoveryReport, EngineContext, FileResolver, HandleId, LoaderConfig, LoaderError, LoaderResult, ModuleHandle, TypeTable};
use dotwasm_reflect::{Scope, TypeRegistry};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// WebAssembly loader.
///
/// Owns the engine context and every module handle it produced. Each handle
/// carries its own store, so unloading it frees the instances it created. Not meant
/// to be shared between threads; use one loader per thread.
pub struct WasmLoader {
    /// Loaded handles, released before the engine context
    handles: BTreeMap<HandleId, ModuleHandle>,
    types: TypeTable,
    context: EngineContext,
    config: LoaderConfig,
    next_handle: u64,
}

impl WasmLoader {
    /// Create the engine context, then register the numeric value types in `registry`.
    ///
    /// Nothing acquired by a failed call survives it.
    #[instrument(skip(config, registry))]
    pub fn initialize(config: LoaderConfig, registry: &mut TypeRegistry) -> LoaderResult<Self> {
        let context = EngineContext::new(&config).inspect_err(|e| error!("WebAssembly loader: Failed to create engine: {}", e))?;
        let types = TypeTable::register(registry).inspect_err(|e| error!("WebAssembly loader: Failed to initialize types: {}", e))?;

        info!("WebAssembly loader initialized with {} search paths", context.search_paths().len());

        Ok(Self { handles: BTreeMap::new(), types, context, config, next_handle: 1 })
    }

    /// Append a directory to the search path list
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.context.add_search_path(path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        self.context.search_paths()
    }

    /// Load every file in `paths` into one new handle.
    ///
    /// The batch is all-or-nothing: the first file that cannot be found, read,
    /// compiled or instantiated discards every module loaded before it.
    #[instrument(skip(self, paths), fields(count = paths.len()))]
    pub fn load_from_file<P: AsRef<Path>>(&mut self, paths: &[P]) -> LoaderResult<HandleId> {
        let id = self.allocate_id();
        let mut handle = ModuleHandle::create(id, paths.len(), &self.context)?;

        for path in paths {
            let path = path.as_ref();
            let resolved = match FileResolver::new(self.context.search_paths(), self.config.max_module_size).resolve(path) {
                Ok(resolved) => resolved,
                Err(e) => {
                    error!("WebAssembly loader: Failed to open file {}: {}", path.display(), e);
                    handle.clear();
                    return Err(e);
                }
            };
            handle.add_module(&self.context, &path.display().to_string(), &resolved.bytes)?;
        }

        Ok(self.insert_handle(handle))
    }

    /// Load a single module from an in-memory binary. `name` is used for logging only.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn load_from_memory(&mut self, name: &str, bytes: &[u8]) -> LoaderResult<HandleId> {
        let size = bytes.len() as u64;
        if size > self.config.max_module_size {
            return Err(LoaderError::ModuleTooLarge { size, limit: self.config.max_module_size });
        }

        let id = self.allocate_id();
        let mut handle = ModuleHandle::create(id, 1, &self.context)?;
        handle.add_module(&self.context, name, bytes)?;

        Ok(self.insert_handle(handle))
    }

    /// Package loading is not supported
    pub fn load_from_package(&mut self, path: impl AsRef<Path>) -> LoaderResult<HandleId> {
        Err(LoaderError::unsupported(format!("loading WebAssembly packages ({})", path.as_ref().display())))
    }

    /// Define every function export of the handle's modules in `scope`, in load order.
    ///
    /// Only an unknown handle fails the call; per-export failures are logged and
    /// counted in the returned report.
    #[instrument(skip(self, scope), fields(scope = scope.name()))]
    pub fn discover(&self, id: HandleId, scope: &mut Scope) -> LoaderResult<DiscoveryReport> {
        let handle = self.handle(id).ok_or(LoaderError::UnknownHandle { id: id.as_u64() })?;

        let mut report = DiscoveryReport::default();
        for module in handle.modules() {
            report.merge(discover_module(&self.types, module, scope));
        }

        debug!("Discovered handle {}: {} defined, {} skipped, {} failed", id, report.defined, report.skipped, report.failed);
        Ok(report)
    }

    /// Release a handle and all of its modules.
    ///
    /// Unloading an id twice fails with `UnknownHandle` and releases nothing.
    pub fn unload(&mut self, id: HandleId) -> LoaderResult<()> {
        let mut handle = self.handles.remove(&id).ok_or(LoaderError::UnknownHandle { id: id.as_u64() })?;
        handle.clear();
        debug!("Unloaded handle {}", id);
        Ok(())
    }

    /// Unload every outstanding handle with its store, then release the engine
    pub fn teardown(self) {
        drop(self);
    }

    pub fn handle(&self, id: HandleId) -> Option<&ModuleHandle> {
        self.handles.get(&id)
    }

    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }

    pub fn module_count(&self, id: HandleId) -> LoaderResult<usize> {
        self.handle(id).map(ModuleHandle::len).ok_or(LoaderError::UnknownHandle { id: id.as_u64() })
    }

    /// Names of the handle's modules in load order
    pub fn module_names(&self, id: HandleId) -> LoaderResult<Vec<&str>> {
        let handle = self.handle(id).ok_or(LoaderError::UnknownHandle { id: id.as_u64() })?;
        Ok(handle.modules().iter().map(|module| module.name()).collect())
    }

    /// Modules compiled by this loader that have not been released yet
    pub fn live_module_count(&self) -> usize {
        self.context.live_module_count()
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    fn allocate_id(&mut self) -> HandleId {
        let id = HandleId(self.next_handle);
        self.next_handle += 1;
        id
    }

    fn insert_handle(&mut self, mut handle: ModuleHandle) -> HandleId {
        handle.finish();
        let id = handle.id();
        self.handles.insert(id, handle);
        id
    }

    fn unload_all(&mut self) {
        while let Some((id, mut handle)) = self.handles.pop_first() {
            debug!("Unloading outstanding handle {}", id);
            handle.clear();
        }
    }
}

impl Drop for WasmLoader {
    fn drop(&mut self) {
        self.unload_all();
        debug!("WebAssembly loader destroyed");
    }
}

impl std::fmt::Debug for WasmLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmLoader").field("handles", &self.handles.len()).field("context", &self.context).field("config", &self.config).finish()
    }
}
