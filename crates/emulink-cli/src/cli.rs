//! CLI argument definitions for emulink.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use emulink_core::config::transport::DEFAULT_PORT;

#[derive(Parser)]
#[command(name = "emulink")]
#[command(about = "Live memory viewer for console emulators", version)]
pub struct Args {
    /// Engine settings (JSON)
    #[arg(short, long, global = true, value_name = "FILE", env = "EMULINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Console list (JSON array); built-in Dolphin consoles if missing
    #[arg(long, global = true, value_name = "FILE", default_value = "consoles.json")]
    pub consoles: PathBuf,

    /// Directory of game profiles
    #[arg(long, global = true, value_name = "DIR", default_value = "profiles")]
    pub profiles: PathBuf,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Detect the running game and print live values (default)
    Watch {
        /// Print each snapshot as a JSON line
        #[arg(long)]
        json: bool,
    },
    /// Read memory once and print a hexdump
    Read {
        /// Memory server port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Address to read (hex, e.g., 0x80000000)
        #[arg(long)]
        address: String,
        /// Number of bytes (max 1024)
        #[arg(long, default_value = "64")]
        size: usize,
        /// Show ASCII column
        #[arg(long)]
        ascii: bool,
    },
    /// Evaluate a formula against a raw value
    Eval {
        /// Formula using `v` for the value, e.g. "(v-1)/4"
        formula: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Write an integer to memory once (big-endian)
    Write {
        /// Memory server port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Address to write (hex)
        #[arg(long)]
        address: String,
        /// Width in bytes: 1, 2 or 4
        #[arg(long, default_value = "1")]
        size: usize,
        #[arg(long, allow_negative_numbers = true)]
        value: i32,
    },
}
