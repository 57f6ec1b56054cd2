//! nodedb-cache Batch Inspector
//!
//! Decodes a dirty batch file and prints what it would persist.

use std::path::PathBuf;

use clap::Parser;
use nodedb_cache::DirtyBatch;
use tracing_subscriber::{fmt, EnvFilter};

/// nodedb-cache Batch Inspector
#[derive(Parser, Debug)]
#[command(name = "nodedb-cache-inspect")]
#[command(about = "Inspect a dirty batch written by a cache layer")]
#[command(version)]
struct Args {
    /// Batch file to decode
    file: PathBuf,

    /// List every entry, not just the summary
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,nodedb_cache=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("nodedb-cache inspect v{}", nodedb_cache::VERSION);

    let batch = match DirtyBatch::read_from(&args.file) {
        Ok(batch) => batch,
        Err(e) => {
            tracing::error!("Failed to read batch {}: {}", args.file.display(), e);
            std::process::exit(1);
        }
    };

    print_summary(&batch);
    if args.verbose {
        print_entries(&batch);
    }
}

fn print_summary(batch: &DirtyBatch) {
    println!("versions:       {}..={}", batch.first_version, batch.last_version);
    println!("node writes:    {}", batch.nodes.len());
    println!("node deletes:   {}", batch.deleted_nodes.len());
    println!("root writes:    {}", batch.roots.len());
    println!("root deletes:   {}", batch.deleted_roots.len());
    println!("orphans:        {}", batch.orphans.len());

    let versions: Vec<String> = batch.roots.keys().map(|v| v.to_string()).collect();
    println!("root versions:  [{}]", versions.join(", "));
}

fn print_entries(batch: &DirtyBatch) {
    for (key, value) in &batch.nodes {
        println!("node   put {} ({} bytes)", key, value.len());
    }
    for key in &batch.deleted_nodes {
        println!("node   del {}", key);
    }
    for (version, hash) in &batch.roots {
        println!("root   put {} {}", version, hex::encode(hash));
    }
    for version in &batch.deleted_roots {
        println!("root   del {}", version);
    }
    for (key, hash) in &batch.orphans {
        println!("orphan     {} -> {}", key, hex::encode(hash));
    }
}
