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

//! DotWasm CLI Tool
//!
//! Main entry point for the DotWasm command-line interface.

use clap::{Parser, Subcommand};
use dotwasm_tools::cli::inspect::{InspectArgs, run_inspect};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dotwasm")]
#[command(about = "DotWasm - WebAssembly module loader")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load modules and list the functions they export
    Inspect(InspectArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match cli.command {
        Commands::Inspect(args) => {
            let json = args.json;
            let output = run_inspect(args)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{output}");
            }
        }
    }

    Ok(())
}
