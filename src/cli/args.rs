//! CLI argument definitions using clap

use crate::models::BundleFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fiel-convert")]
#[command(version)]
#[command(about = "Convert SAT FIEL credentials to PEM, PKCS#12 and JKS", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: config/default.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a password protected keystore from the key and certificate
    Bundle(BundleArgs),

    /// Decrypt the private key into an unencrypted PEM file
    KeyPem(KeyPemArgs),

    /// Write the public key and certificate as PEM
    CertPem(CertPemArgs),

    /// Produce every output in one run
    All(BundleArgs),
}

/// Input file selection
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Encrypted private key (.key); discovered in --dir when omitted
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,

    /// Certificate (.cer); discovered in --dir when omitted
    #[arg(long = "cer", value_name = "FILE")]
    pub cer: Option<PathBuf>,

    /// Directory searched for missing inputs
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

/// Keystore format flags
#[derive(Args, Debug, Clone)]
pub struct FormatArgs {
    /// Write a Java KeyStore (same as --format jks)
    #[arg(long, conflicts_with = "format")]
    pub jks: bool,

    /// Keystore format (default from settings)
    #[arg(long, value_enum)]
    pub format: Option<KeystoreFormat>,
}

impl FormatArgs {
    /// The requested format, falling back to `default`
    pub fn resolve(&self, default: BundleFormat) -> BundleFormat {
        if self.jks {
            BundleFormat::Jks
        } else {
            self.format.map(BundleFormat::from).unwrap_or(default)
        }
    }
}

#[derive(Args, Clone)]
pub struct BundleArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Password of the private key (prompted when omitted)
    #[arg(short, long, value_name = "PWD")]
    pub password: Option<String>,

    /// Keystore password; prompted when given without a value, defaults to --password
    #[arg(long, value_name = "PWD", num_args = 0..=1, default_missing_value = "")]
    pub password_final: Option<String>,

    #[command(flatten)]
    pub format: FormatArgs,
}

/// Private key selection for commands that only read the key
#[derive(Args, Debug, Clone)]
pub struct KeyInputArgs {
    /// Encrypted private key (.key); discovered in --dir when omitted
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,

    /// Directory searched when --key is omitted
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

/// Certificate selection for commands that only read the certificate
#[derive(Args, Debug, Clone)]
pub struct CertInputArgs {
    /// Certificate (.cer); discovered in --dir when omitted
    #[arg(long = "cer", value_name = "FILE")]
    pub cer: Option<PathBuf>,

    /// Directory searched when --cer is omitted
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Args, Clone)]
pub struct KeyPemArgs {
    #[command(flatten)]
    pub input: KeyInputArgs,

    /// Password of the private key (prompted when omitted)
    #[arg(short, long, value_name = "PWD")]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CertPemArgs {
    #[command(flatten)]
    pub input: CertInputArgs,
}

/// Keystore format as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeystoreFormat {
    #[value(alias = "pkcs12", alias = "pfx")]
    P12,
    Jks,
}

impl From<KeystoreFormat> for BundleFormat {
    fn from(format: KeystoreFormat) -> Self {
        match format {
            KeystoreFormat::P12 => BundleFormat::P12,
            KeystoreFormat::Jks => BundleFormat::Jks,
        }
    }
}
