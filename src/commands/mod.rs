//! Command implementations for fiel-convert

pub mod convert;

pub use convert::{run_all, run_bundle, run_cert_pem, run_key_pem};

use crate::cli::{Cli, Commands};
use crate::config::Settings;

/// Dispatch a parsed command line, returning the process exit status
pub fn run(cli: &Cli, settings: &Settings) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Bundle(args) => run_bundle(args, settings),
        Commands::KeyPem(args) => run_key_pem(args),
        Commands::CertPem(args) => run_cert_pem(args),
        Commands::All(args) => run_all(args, settings),
    }
}
