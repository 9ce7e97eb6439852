mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use cli::{Args, Command};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    // --verbose wins over RUST_LOG
    let env_filter = if args.verbose {
        EnvFilter::new("emulink=debug,emulink_core=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("emulink=info,emulink_core=info"))
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = commands::load_engine_config(args.config.as_deref());

    match args.command.unwrap_or(Command::Watch { json: false }) {
        Command::Watch { json } => {
            commands::watch::run(config, &args.consoles, &args.profiles, json)
        }
        Command::Read {
            port,
            address,
            size,
            ascii,
        } => commands::read::run(&config, port, &address, size, ascii),
        Command::Eval { formula, value } => commands::eval::run(&formula, value),
        Command::Write {
            port,
            address,
            size,
            value,
        } => commands::write::run(&config, port, &address, size, value),
    }
}
