use std::panic;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

mod archive;
mod cli;
mod config;
mod constants;
mod core;
mod native;
mod project;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    match cli::run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(message = "command failed", error = %e);
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
