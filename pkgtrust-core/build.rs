//! Build script validating the embedded release certificate.
//!
//! `PKGTRUST_TRUSTED_CERT` carries the base64 body of the release certificate
//! (or its public key) into the library via `option_env!`. A value that does
//! not decode to either fails the build here, not at app launch.

use base64::Engine;
use der::Decode;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

const TRUSTED_CERT_VAR: &str = "PKGTRUST_TRUSTED_CERT";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tell Cargo to re-run when the embedded certificate changes
    println!("cargo:rerun-if-env-changed={TRUSTED_CERT_VAR}");
    println!("cargo:rerun-if-changed=build.rs");

    let body = match std::env::var(TRUSTED_CERT_VAR) {
        Ok(body) => body,
        Err(_) => return Ok(()),
    };
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Ok(());
    }

    let der = base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| format!("{TRUSTED_CERT_VAR} is not valid base64: {e}"))?;

    if let Err(cert_error) = Certificate::from_der(&der) {
        SubjectPublicKeyInfoOwned::from_der(&der).map_err(|key_error| {
            format!(
                "{TRUSTED_CERT_VAR} is neither an X.509 certificate ({cert_error}) nor a public key ({key_error})"
            )
        })?;
    }

    Ok(())
}
