//! Command-line interface module
//!
//! This module handles CLI argument parsing using Clap, input discovery and
//! password prompts.

pub mod args;
pub mod discovery;
pub mod prompt;

pub use args::{
    BundleArgs, CertInputArgs, CertPemArgs, Cli, Commands, FormatArgs, InputArgs, KeyInputArgs,
    KeyPemArgs, KeystoreFormat,
};
