//! Signing error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while resolving trusted signing material
#[derive(Error, Debug)]
pub enum SigningError {
    /// The base64 body could not be decoded
    #[error("Trusted certificate is not valid base64: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    /// A PEM block was present but had no decodable body
    #[error("Trusted certificate PEM block is malformed")]
    InvalidPem,

    /// The decoded bytes are neither an X.509 certificate nor a SubjectPublicKeyInfo
    #[error("Trusted material is neither an X.509 certificate nor a public key: {reason}")]
    NotCertificateOrKey { reason: String },

    /// No trusted certificate was compiled into this build
    #[error("No trusted certificate embedded in this build.\n\nSet PKGTRUST_TRUSTED_CERT to the base64 body of the release certificate at build time.")]
    EmbeddedMissing,

    /// Failed to read trusted material from disk
    #[error("Failed to read trusted certificate from {path}")]
    TrustedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single signer certificate failed to verify
///
/// These are per-candidate results, folded into the verdict. None of them
/// abort the overall check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignerRejection {
    /// Signer bytes are not a DER X.509 certificate
    #[error("malformed signer certificate: {0}")]
    Malformed(String),

    /// Signature algorithm or key type cannot be checked against the trusted key
    #[error("unsupported signature: {0}")]
    Unsupported(String),

    /// Well-formed certificate whose signature does not validate under the trusted key
    #[error("signature does not verify against the trusted key")]
    Mismatch,
}

impl SignerRejection {
    /// Short label for tables and structured logs
    pub fn label(&self) -> &'static str {
        match self {
            SignerRejection::Malformed(_) => "malformed",
            SignerRejection::Unsupported(_) => "unsupported",
            SignerRejection::Mismatch => "mismatch",
        }
    }
}
