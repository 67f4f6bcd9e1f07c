// Copyright (C) 2024, 2025 Roundkeeper Developers (see AUTHORS)
//
// This file is part of Roundkeeper
//
// Roundkeeper is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Roundkeeper is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// Roundkeeper. If not, see <https://www.gnu.org/licenses/>.

use clap::{Parser, Subcommand};
use roundkeeper_accounting::Chain;
use roundkeeper_lib::cli_commands;
use roundkeeper_lib::config::Config;
use roundkeeper_lib::logging::setup_logging;
use std::error::Error;
use std::process::ExitCode;
use tracing::error;

/// Roundkeeper CLI utility
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to roundkeeper config file
    #[arg(short, long, env = "ROUNDKEEPER_CONFIG")]
    config: String,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show counts, shares, times and submissions of a round
    Round {
        /// Chain to inspect, primary or auxiliary
        #[arg(short, long, default_value_t = Chain::Primary)]
        chain: Chain,
        /// Height of an archived round, the open round if omitted
        #[arg(long)]
        height: Option<u64>,
    },
    /// Show block counts and blocks pending confirmation
    Blocks {
        /// Chain to inspect, primary or auxiliary
        #[arg(short, long, default_value_t = Chain::Primary)]
        chain: Chain,
    },
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = Config::load(&cli.config)?;
    let _guard = setup_logging(&config.logging)?;

    let pool = config.pool.identifier.as_str();
    match cli.command {
        Some(Commands::Round { chain, height }) => {
            let store = cli_commands::store::open_store(config.store.path.clone())?;
            cli_commands::round_info::execute(&store, pool, chain, height)?;
        }
        Some(Commands::Blocks { chain }) => {
            let store = cli_commands::store::open_store(config.store.path.clone())?;
            cli_commands::blocks_info::execute(&store, pool, chain)?;
        }
        None => {
            println!("No command specified. Use --help for usage information.");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
