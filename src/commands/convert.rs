//! Conversion subcommands
//!
//! Each command resolves its inputs and passwords, runs the requested
//! conversions and prints one line per output. The returned value is the
//! process exit status.

use crate::cli::discovery::{self, CERT_EXTENSION, KEY_EXTENSION};
use crate::cli::{prompt, BundleArgs, CertPemArgs, KeyPemArgs};
use crate::config::Settings;
use crate::credential::{run_conversions, validate_bundle_password, ConversionOutcome, ConversionRequest, OutputKind};
use crate::utils::{ConversionError, Operation};
use console::style;
use std::path::Path;

/// `bundle`: write a PKCS#12 or JKS keystore next to the certificate
pub fn run_bundle(args: &BundleArgs, settings: &Settings) -> anyhow::Result<i32> {
    let format = args.format.resolve(settings.bundle.format);
    let inputs = &args.inputs;
    let cert_path = discovery::resolve_input(inputs.cer.as_deref(), &inputs.dir, CERT_EXTENSION)?;

    // An explicit keystore password is checked before anything is read or prompted
    if let Some(target) = args.password_final.as_deref().filter(|p| !p.is_empty()) {
        if let Err(e) = validate_bundle_password(target, format) {
            let err = ConversionError::new(Operation::ProtectedBundle, &cert_path, e);
            print_failure(&err);
            return Ok(err.exit_code());
        }
    }

    let key_path = discovery::resolve_input(inputs.key.as_deref(), &inputs.dir, KEY_EXTENSION)?;
    let password = prompt::source_password(args.password.as_deref())?;
    let new_password = prompt::target_password(args.password_final.as_deref(), format)?;

    tracing::debug!(
        key = %key_path.display(),
        cer = %cert_path.display(),
        %format,
        "Starting conversions"
    );

    let request = ConversionRequest {
        key_path: Some(key_path),
        cert_path: Some(cert_path),
        password,
        new_password,
        outputs: vec![OutputKind::Bundle(format)],
    };
    Ok(report(&run_conversions(&request)))
}

/// `all`: key PEM, certificate PEM and keystore, each attempted independently.
///
/// An input that cannot be found or unlocked only drops the outputs that
/// depend on it; the rest still run.
pub fn run_all(args: &BundleArgs, settings: &Settings) -> anyhow::Result<i32> {
    let format = args.format.resolve(settings.bundle.format);
    let inputs = &args.inputs;
    let mut setup_failure = None;

    let cert_path = discovery::resolve_input(inputs.cer.as_deref(), &inputs.dir, CERT_EXTENSION)
        .map_err(|e| record_setup_failure(&e, &mut setup_failure))
        .ok();
    let key_path = discovery::resolve_input(inputs.key.as_deref(), &inputs.dir, KEY_EXTENSION)
        .map_err(|e| record_setup_failure(&e, &mut setup_failure))
        .ok();

    let password = match key_path {
        Some(_) => prompt::source_password(args.password.as_deref())
            .map_err(|e| record_setup_failure(&e, &mut setup_failure))
            .ok(),
        None => None,
    };

    // The keystore password is validated by the bundle output itself
    let new_password = match (&password, &cert_path) {
        (Some(_), Some(_)) => prompt::target_password(args.password_final.as_deref(), format)
            .map_err(|e| record_setup_failure(&e, &mut setup_failure))
            .ok(),
        _ => None,
    };

    let mut outputs = Vec::new();
    if password.is_some() {
        outputs.push(OutputKind::KeyPem);
    }
    if cert_path.is_some() {
        outputs.push(OutputKind::CertificatePem);
    }
    if new_password.is_some() {
        outputs.push(OutputKind::Bundle(format));
    }

    tracing::debug!(?outputs, %format, "Starting conversions");

    let request = ConversionRequest {
        key_path,
        cert_path,
        password: password.unwrap_or_default(),
        new_password: new_password.flatten(),
        outputs,
    };
    let exit_code = report(&run_conversions(&request));
    Ok(setup_failure.unwrap_or(exit_code))
}

/// `key-pem`: decrypt the private key to `<stem>.pem`
pub fn run_key_pem(args: &KeyPemArgs) -> anyhow::Result<i32> {
    let input = &args.input;
    let key_path = discovery::resolve_input(input.key.as_deref(), &input.dir, KEY_EXTENSION)?;
    let password = prompt::source_password(args.password.as_deref())?;

    let request = ConversionRequest {
        key_path: Some(key_path),
        password,
        outputs: vec![OutputKind::KeyPem],
        ..Default::default()
    };
    Ok(report(&run_conversions(&request)))
}

/// `cert-pem`: write `<stem>_CER.pem`
pub fn run_cert_pem(args: &CertPemArgs) -> anyhow::Result<i32> {
    let input = &args.input;
    let cert_path = discovery::resolve_input(input.cer.as_deref(), &input.dir, CERT_EXTENSION)?;

    let request = ConversionRequest {
        cert_path: Some(cert_path),
        outputs: vec![OutputKind::CertificatePem],
        ..Default::default()
    };
    Ok(report(&run_conversions(&request)))
}

/// Print every outcome and return the exit status of the first failure
fn report(outcomes: &[ConversionOutcome]) -> i32 {
    let mut exit_code = 0;

    for outcome in outcomes {
        match &outcome.result {
            Ok(path) => print_success(&outcome.output, path),
            Err(e) => {
                print_failure(e);
                if exit_code == 0 {
                    exit_code = e.exit_code();
                }
            }
        }
    }

    exit_code
}

fn print_success(output: &OutputKind, path: &Path) {
    println!(
        "  {} {}: {}",
        style("✓").green(),
        output,
        style(path.display()).bold()
    );
}

fn print_failure(err: &ConversionError) {
    eprintln!("{} {}", style("Error:").red().bold(), err);
}

/// Print a discovery or prompt failure and keep the first exit status
fn record_setup_failure(err: &anyhow::Error, first: &mut Option<i32>) {
    eprintln!("{} {:#}", style("Error:").red().bold(), err);
    first.get_or_insert(1);
}
