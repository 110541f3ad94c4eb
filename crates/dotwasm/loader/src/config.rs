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

//! Loader configuration

use crate::{LoaderError, LoaderResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment variable holding additional search paths (platform path-list syntax)
pub const ENV_LOADER_PATH: &str = "DOTWASM_LOADER_PATH";

/// Environment variable overriding the maximum module size in bytes
pub const ENV_MAX_MODULE_SIZE: &str = "DOTWASM_MAX_MODULE_SIZE";

/// Default upper bound for a single module binary (64 MiB)
pub const DEFAULT_MAX_MODULE_SIZE: u64 = 64 * 1024 * 1024;

/// Default fuel budget of a module handle when metering is enabled
pub const DEFAULT_FUEL: u64 = 10_000_000;

/// How the engine translates function bodies.
///
/// Both strategies validate every body at compile time, so an ill-typed
/// module always fails to compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationStrategy {
    /// Translate and validate everything up front
    #[default]
    Eager,
    /// Validate up front, translate on first call
    LazyTranslation,
}

impl From<CompilationStrategy> for wasmi::CompilationMode {
    fn from(strategy: CompilationStrategy) -> Self {
        match strategy {
            CompilationStrategy::Eager => wasmi::CompilationMode::Eager,
            CompilationStrategy::LazyTranslation => wasmi::CompilationMode::LazyTranslation,
        }
    }
}

/// Loader Configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directories searched, in order, for relative module names
    pub search_paths: Vec<PathBuf>,
    /// Maximum size of a single module binary in bytes
    pub max_module_size: u64,
    /// Function body translation strategy
    pub compilation: CompilationStrategy,
    /// Enable fuel metering in the engine
    pub consume_fuel: bool,
    /// Fuel each module handle starts with when metering is enabled
    pub fuel: u64,
    /// Accept modules using the multi-value proposal
    pub multi_value: bool,
    /// Accept modules using the reference-types proposal
    pub reference_types: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            max_module_size: DEFAULT_MAX_MODULE_SIZE,
            compilation: CompilationStrategy::default(),
            consume_fuel: false,
            fuel: DEFAULT_FUEL,
            multi_value: true,
            reference_types: true,
        }
    }
}

impl LoaderConfig {
    /// Build a configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(paths) = lookup(ENV_LOADER_PATH) {
            config.search_paths.extend(std::env::split_paths(&paths).filter(|path| !path.as_os_str().is_empty()));
        }

        if let Some(size) = lookup(ENV_MAX_MODULE_SIZE) {
            match size.parse::<u64>() {
                Ok(size) => config.max_module_size = size,
                Err(_) => warn!("Invalid {} '{}', using default", ENV_MAX_MODULE_SIZE, size),
            }
        }

        config
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| LoaderError::config(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&contents).map_err(|e| LoaderError::config(format!("{}: {e}", path.display())))
    }

    /// Check the configuration for values the engine cannot work with
    pub fn validate(&self) -> LoaderResult<()> {
        if self.max_module_size == 0 {
            return Err(LoaderError::config("max_module_size must be greater than zero"));
        }
        if self.consume_fuel && self.fuel == 0 {
            return Err(LoaderError::config("fuel must be greater than zero when consume_fuel is enabled"));
        }
        Ok(())
    }

    /// Engine configuration derived from this loader configuration
    pub fn engine_config(&self) -> wasmi::Config {
        let mut config = wasmi::Config::default();
        config
            .compilation_mode(self.compilation.into())
            .consume_fuel(self.consume_fuel)
            .wasm_multi_value(self.multi_value)
            .wasm_reference_types(self.reference_types);
        config
    }
}
