//! Writes the service's `OpenAPI` document without starting the server.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rollcall::kernel::config;

#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Export the OpenAPI document")]
struct Args {
    /// Destination file; parent directories are created.
    #[arg(short, long, default_value = "interfaces/openapi.json")]
    output: PathBuf,
}

#[allow(clippy::print_stdout)]
fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = config::load();

    let doc = rollcall_server::openapi(&cfg, rollcall::route_groups());
    let json = serde_json::to_string_pretty(&doc).context("Serializing OpenAPI document")?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Creating {}", parent.display()))?;
    }
    fs::write(&args.output, json).with_context(|| format!("Writing {}", args.output.display()))?;

    println!("OpenAPI document written to {} ({} paths)", args.output.display(), doc.paths.paths.len());
    Ok(())
}
