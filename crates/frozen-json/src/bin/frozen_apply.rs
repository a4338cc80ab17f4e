//! `frozen-apply` — apply update operations to a JSON document.
//!
//! Usage:
//!   frozen-apply '<ops-array-json>'
//!
//! The document is read from stdin. Each operation is an object
//! `{"op": "replace", "path": ["a", 0], "options": {...}}`.
//! Set `RUST_LOG=frozen_json=trace` to watch propagation.

use std::io::{self, Read, Write};

use frozen_json::cli::apply_ops;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let ops = match args.get(1) {
        Some(ops) => ops.clone(),
        None => {
            eprintln!("First argument must be a JSON array of operations.");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match apply_ops(buf.trim(), &ops) {
        Ok(result) => {
            let mut out = io::stdout();
            if let Err(e) = out.write_all(result.as_bytes()).and_then(|_| out.write_all(b"\n")) {
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
