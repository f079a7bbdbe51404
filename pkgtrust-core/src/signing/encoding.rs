//! PEM/base64 helpers and certificate fingerprints

use base64::Engine;
use sha2::{Digest, Sha256};

use super::error::SigningError;

/// Decode the base64 body of a PEM block
///
/// Whitespace and line breaks are ignored, so both a single-line build
/// constant and a wrapped body pasted from a PEM file are accepted.
pub fn decode_body(body: &str) -> Result<Vec<u8>, SigningError> {
    let compact: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}

/// Extract DER bytes from the first PEM block in `pem`.
pub fn pem_to_der(pem: &str) -> Option<Vec<u8>> {
    let mut b64 = String::new();
    let mut in_body = false;

    for line in pem.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("-----BEGIN ") {
            in_body = true;
            continue;
        }
        if trimmed.starts_with("-----END ") {
            break;
        }
        if in_body {
            b64.push_str(trimmed);
        }
    }

    if b64.is_empty() {
        return None;
    }

    base64::engine::general_purpose::STANDARD.decode(&b64).ok()
}

/// Wrap DER bytes in PEM with the given label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let b64 = base64::engine::general_purpose::STANDARD.encode(der);
    let mut pem = format!("-----BEGIN {label}-----\n");
    for chunk in b64.as_bytes().chunks(64) {
        // base64 output is ASCII
        pem.push_str(&String::from_utf8_lossy(chunk));
        pem.push('\n');
    }
    pem.push_str(&format!("-----END {label}-----\n"));
    pem
}

/// Whether raw file contents look like a PEM document rather than DER
pub fn is_pem(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(64)];
    String::from_utf8_lossy(head).trim_start().starts_with("-----BEGIN ")
}

/// Decode file contents that may be PEM or DER
///
/// PEM input whose body cannot be decoded is returned unchanged so the
/// caller sees a malformed certificate instead of losing the entry.
pub fn pem_or_der(bytes: Vec<u8>) -> Vec<u8> {
    if !is_pem(&bytes) {
        return bytes;
    }
    match std::str::from_utf8(&bytes).ok().and_then(pem_to_der) {
        Some(der) => der,
        None => bytes,
    }
}

/// SHA-256 fingerprint of DER bytes, formatted as `sha256:<hex>`
pub fn fingerprint(der: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(der);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
