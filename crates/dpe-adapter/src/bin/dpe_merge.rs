//! `dpe-merge`: merge property editor documents.
//!
//! Usage:
//!   dpe-merge <doc.json>...
//!
//! Rows are paired by their first label. The merged document is printed to
//! stdout; set `RUST_LOG` (for example `RUST_LOG=dpe_adapter=debug`) for
//! diagnostics on stderr.

use std::io::{self, Write};

use dpe_adapter::cli::merge_files;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: dpe-merge <doc.json>...");
        std::process::exit(1);
    }

    match merge_files(&paths) {
        Ok(merged) => {
            let mut stdout = io::stdout().lock();
            if let Err(e) = writeln!(stdout, "{merged}") {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
