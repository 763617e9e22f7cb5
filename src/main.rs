//! fiel-convert - SAT FIEL credential converter
//!
//! Turns the `.key`/`.cer` pair issued by SAT into:
//! - An unencrypted PEM private key
//! - A PEM file with the public key and certificate
//! - A PKCS#12 or JKS keystore using the holder's RFC as alias

use clap::Parser;
use console::style;
use fiel_convert::cli::Cli;
use fiel_convert::config::{self, Settings};
use fiel_convert::commands;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // Handle color preference
    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let settings = match config::load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    init_logging(&settings, cli.verbose);

    match commands::run(&cli, &settings) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Initialize logging; `RUST_LOG` wins over the settings file
fn init_logging(settings: &Settings, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        settings.logging.level.as_str()
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
