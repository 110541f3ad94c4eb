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

//! Inspect command: load modules and list their exported functions

use anyhow::Context as _;
use clap::Args;
use dotwasm_loader::{DiscoveryReport, LoaderConfig, WasmLoader};
use dotwasm_reflect::{Context, Function, TypeRegistry};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Module files to load, resolved against the search paths unless absolute
    #[arg(value_name = "MODULE", required = true)]
    pub modules: Vec<PathBuf>,

    /// Additional search path (may be repeated)
    #[arg(short = 'p', long = "path", value_name = "DIR")]
    pub search_paths: Vec<PathBuf>,

    /// JSON loader configuration file (defaults to the environment)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read each module from disk directly and load it from memory
    #[arg(long)]
    pub from_memory: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// One discovered function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSummary {
    pub name: String,
    pub params: Vec<String>,
    pub returns: Option<String>,
}

impl From<&Function> for FunctionSummary {
    fn from(function: &Function) -> Self {
        let signature = function.signature();
        Self {
            name: function.name().to_string(),
            params: signature.parameters().map(|param| param.map_or_else(|| "?".to_string(), |p| p.ty.name().to_string())).collect(),
            returns: signature.return_type().map(|ty| ty.name().to_string()),
        }
    }
}

/// Result of an inspect run
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    /// Loaded module names in load order
    pub modules: Vec<String>,
    /// Discovered functions, ordered by name
    pub functions: Vec<FunctionSummary>,
    pub report: DiscoveryReport,
}

impl fmt::Display for InspectOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for function in &self.functions {
            write!(f, "{}({})", function.name, function.params.join(", "))?;
            if let Some(ret) = &function.returns {
                write!(f, " -> {ret}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "{} modules: {} defined, {} skipped, {} failed", self.modules.len(), self.report.defined, self.report.skipped, self.report.failed)
    }
}

/// Execute the inspect command
pub fn run_inspect(args: InspectArgs) -> anyhow::Result<InspectOutput> {
    let mut config = match &args.config {
        Some(path) => LoaderConfig::from_json_file(path).with_context(|| format!("loading configuration {}", path.display()))?,
        None => LoaderConfig::from_env(),
    };
    config.search_paths.extend(args.search_paths.iter().cloned());

    let mut registry = TypeRegistry::new();
    let mut loader = WasmLoader::initialize(config, &mut registry)?;

    let handles = if args.from_memory {
        let mut handles = Vec::with_capacity(args.modules.len());
        for path in &args.modules {
            let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            handles.push(loader.load_from_memory(&path.display().to_string(), &bytes)?);
        }
        handles
    } else {
        vec![loader.load_from_file(&args.modules)?]
    };

    let mut context = Context::new("inspect");
    let mut report = DiscoveryReport::default();
    let mut modules = Vec::new();
    for handle in &handles {
        report.merge(loader.discover(*handle, context.scope_mut())?);
        modules.extend(loader.module_names(*handle)?.into_iter().map(String::from));
    }

    let functions = context.scope().functions().map(|function| FunctionSummary::from(function.as_ref())).collect();
    info!("Inspected {} modules", modules.len());
    loader.teardown();

    Ok(InspectOutput { modules, functions, report })
}
