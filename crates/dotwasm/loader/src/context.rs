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

//! Engine context: the shared engine, store factory and search paths

use crate::{LoaderConfig, LoaderError, LoaderResult};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use wasmi::{Engine, Store};

/// Owns the engine every module of a loader is compiled with.
///
/// Instances do not live here: each module handle owns its own store, so
/// releasing a handle releases the instance data and linear memory with it.
pub struct EngineContext {
    /// Compilation/runtime engine
    engine: Engine,
    /// Fuel given to every new store, `None` when metering is off
    fuel: Option<u64>,
    /// Search paths in resolution priority order
    search_paths: Vec<PathBuf>,
    /// Number of loaded modules not yet released
    live_modules: Arc<AtomicUsize>,
}

impl EngineContext {
    /// Create the engine, then the search path list
    pub fn new(config: &LoaderConfig) -> LoaderResult<Self> {
        config.validate().map_err(|e| LoaderError::engine_init(e.to_string()))?;

        let engine = Engine::new(&config.engine_config());

        let mut search_paths = Vec::new();
        search_paths.try_reserve(config.search_paths.len()).map_err(|e| LoaderError::alloc(format!("search paths: {e}")))?;
        search_paths.extend(config.search_paths.iter().cloned());

        debug!("Engine context created with {} search paths", search_paths.len());

        Ok(Self { engine, fuel: config.consume_fuel.then_some(config.fuel), search_paths, live_modules: Arc::new(AtomicUsize::new(0)) })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Create a store bound to the engine, topped up with the configured fuel
    pub(crate) fn new_store(&self) -> LoaderResult<Store<()>> {
        let mut store = Store::new(&self.engine, ());
        if let Some(fuel) = self.fuel {
            store.set_fuel(fuel).map_err(|e| LoaderError::engine_init(format!("setting fuel: {e}")))?;
        }
        Ok(store)
    }

    /// Append a search path. No deduplication or existence check is made.
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!("Added search path {}", path.display());
        self.search_paths.push(path);
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub(crate) fn live_modules(&self) -> &Arc<AtomicUsize> {
        &self.live_modules
    }

    /// Number of modules compiled against this context that are still held
    pub fn live_module_count(&self) -> usize {
        self.live_modules.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext").field("fuel", &self.fuel).field("search_paths", &self.search_paths).field("live_modules", &self.live_module_count()).finish_non_exhaustive()
    }
}
