//! tabstate storage inspector
//!
//! Reads and edits the JSON file behind a file-backed tabstate storage,
//! going through the same namespacing, envelope and expiry rules as the
//! application.
//!
//! Usage:
//!   tabstate --file state.json keys
//!   tabstate --file state.json set settings '{"theme":"dark"}' --expires-in 3600

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tabstate_app::init_tracing;
use tabstate_cli::{Command, execute, open_storage};

#[derive(Parser, Debug)]
#[command(name = "tabstate")]
#[command(about = "Inspect and edit tabstate storage files")]
struct Args {
    /// Storage file to operate on
    #[arg(short, long, default_value = "state.json")]
    file: PathBuf,

    /// Key namespace prefix
    #[arg(short, long, default_value = tabstate_storage::DEFAULT_NAMESPACE)]
    namespace: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let storage = open_storage(&args.file, &args.namespace)?;
    for line in execute(&storage, args.command)? {
        println!("{line}");
    }
    Ok(())
}
