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

//! DotWasm Loader
//!
//! Loads compiled WebAssembly binaries against a shared engine, with one store
//! per module handle, and exposes every exported function as a host
//! [`Function`](dotwasm_reflect::Function) with a type-mapped signature.
//!
//! ```no_run
//! use dotwasm_loader::{LoaderConfig, WasmLoader};
//! use dotwasm_reflect::{Context, TypeRegistry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = TypeRegistry::new();
//! let mut loader = WasmLoader::initialize(LoaderConfig::default(), &mut registry)?;
//! loader.add_search_path("./modules");
//!
//! let handle = loader.load_from_file(&["math.wasm"])?;
//! let mut context = Context::new("math");
//! let report = loader.discover(handle, context.scope_mut())?;
//! println!("{} functions discovered", report.defined);
//! loader.teardown();
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod handle;
pub mod loader;
pub mod resolver;
pub mod types;

pub use binding::FunctionBinding;
pub use config::{CompilationStrategy, LoaderConfig};
pub use context::EngineContext;
pub use discovery::DiscoveryReport;
pub use error::{LoaderError, LoaderResult};
pub use handle::{HandleId, HandleState, LoadedModule, ModuleHandle, ResolvedExport};
pub use loader::WasmLoader;
pub use resolver::{FileResolver, ResolvedFile};
pub use types::TypeTable;
