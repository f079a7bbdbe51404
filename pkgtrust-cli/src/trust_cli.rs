//! Trusted-certificate CLI commands
//!
//! Validates the release certificate at configuration time so a bad build
//! constant is caught before it ships.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;

use pkgtrust_core::signing::TrustedCertificate;
use pkgtrust_core::TrustConfig;

#[derive(Parser, Debug)]
pub enum TrustCommand {
    /// Validate the trusted certificate and show its fingerprint
    Inspect {
        /// Trusted certificate file (PEM or DER), overrides config
        #[clap(long)]
        trusted: Option<PathBuf>,

        /// Trust config file (default: ./pkgtrust.yml, then the build-time certificate)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[clap(long)]
        json: bool,

        /// Print the public key as PEM
        #[clap(long)]
        pem: bool,
    },
}

impl TrustCommand {
    /// Execute the trust command
    pub fn execute(&self) -> Result<()> {
        match self {
            TrustCommand::Inspect {
                trusted,
                config,
                json,
                pem,
            } => trust_inspect(trusted.clone(), config.clone(), *json, *pem),
        }
    }
}

/// Resolve and describe the trusted certificate
fn trust_inspect(
    trusted: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
    pem: bool,
) -> Result<()> {
    let trust_config = TrustConfig::discover(trusted, config.as_deref())
        .context("Failed to locate the trusted release certificate")?;
    let certificate = trust_config
        .resolve()
        .context("Trusted release certificate is invalid")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&describe(&certificate))?);
    } else {
        println!("✅ Trusted release certificate is valid");
        println!("   Form:            {}", certificate.form());
        if let Some(subject) = certificate.subject() {
            println!("   Subject:         {subject}");
        }
        println!("   Fingerprint:     {}", certificate.fingerprint());
        println!("   Key fingerprint: {}", certificate.key_fingerprint());
        if pem {
            if let Some(key_pem) = certificate.public_key_pem() {
                println!("\n{key_pem}");
            }
        }
    }

    Ok(())
}

fn describe(certificate: &TrustedCertificate) -> serde_json::Value {
    json!({
        "form": certificate.form().to_string(),
        "subject": certificate.subject(),
        "fingerprint": certificate.fingerprint(),
        "keyFingerprint": certificate.key_fingerprint(),
        "publicKeyPem": certificate.public_key_pem(),
    })
}
