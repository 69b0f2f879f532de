use std::process::ExitCode;

use clap::Parser;
use llvm_driver::{DriverError, Opt};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let opts = Opt::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = std::fs::read_to_string(&opts.filename)
        .map_err(|source| DriverError::Io {
            path: opts.filename.clone(),
            source,
        })
        .and_then(|contents| llvm_driver::process_source(&contents, &opts));

    match result {
        Ok(output) => {
            print!("{output}");
            ExitCode::from(0)
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}
