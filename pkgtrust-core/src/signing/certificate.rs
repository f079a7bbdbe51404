//! Trusted release certificate
//!
//! The organization's release-signing identity, resolved once into the
//! public key that signer certificates are checked against.

use der::{Decode, Encode};
use std::fmt;
use std::path::Path;
use tracing::debug;
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

use super::encoding::{decode_body, der_to_pem, fingerprint, is_pem, pem_to_der};
use super::error::SigningError;

/// Base64 body of the release certificate, captured at compile time
///
/// `build.rs` rejects a value that is not a certificate or public key.
pub const EMBEDDED_TRUSTED_CERT: Option<&str> = option_env!("PKGTRUST_TRUSTED_CERT");

/// How the trusted material was supplied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustedForm {
    /// A full X.509 certificate; its subject public key is used
    Certificate,
    /// A bare SubjectPublicKeyInfo
    PublicKey,
}

impl fmt::Display for TrustedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustedForm::Certificate => write!(f, "certificate"),
            TrustedForm::PublicKey => write!(f, "public key"),
        }
    }
}

/// The trusted release key, validated at construction
#[derive(Debug, Clone)]
pub struct TrustedCertificate {
    public_key: SubjectPublicKeyInfoOwned,
    form: TrustedForm,
    subject: Option<String>,
    fingerprint: String,
}

impl TrustedCertificate {
    /// Resolve trusted material from DER bytes
    ///
    /// Tries an X.509 certificate first, then a bare SubjectPublicKeyInfo.
    pub fn from_der(der: &[u8]) -> Result<Self, SigningError> {
        let cert_error = match Certificate::from_der(der) {
            Ok(cert) => {
                let subject = cert.tbs_certificate.subject.to_string();
                debug!("Trusted material is a certificate for '{}'", subject);
                return Ok(TrustedCertificate {
                    public_key: cert.tbs_certificate.subject_public_key_info,
                    form: TrustedForm::Certificate,
                    subject: Some(subject),
                    fingerprint: fingerprint(der),
                });
            }
            Err(e) => e,
        };

        match SubjectPublicKeyInfoOwned::from_der(der) {
            Ok(public_key) => {
                debug!("Trusted material is a bare public key ({})", public_key.algorithm.oid);
                Ok(TrustedCertificate {
                    public_key,
                    form: TrustedForm::PublicKey,
                    subject: None,
                    fingerprint: fingerprint(der),
                })
            }
            Err(key_error) => Err(SigningError::NotCertificateOrKey {
                reason: format!("as certificate: {cert_error}; as public key: {key_error}"),
            }),
        }
    }

    /// Resolve trusted material from the base64 body of a PEM block
    pub fn from_base64(body: &str) -> Result<Self, SigningError> {
        Self::from_der(&decode_body(body)?)
    }

    /// Resolve trusted material from a full PEM document
    pub fn from_pem(pem: &str) -> Result<Self, SigningError> {
        let der = pem_to_der(pem).ok_or(SigningError::InvalidPem)?;
        Self::from_der(&der)
    }

    /// Load trusted material from a PEM or DER file
    pub fn from_file(path: &Path) -> Result<Self, SigningError> {
        let bytes = std::fs::read(path).map_err(|source| SigningError::TrustedRead {
            path: path.to_path_buf(),
            source,
        })?;

        if is_pem(&bytes) {
            Self::from_pem(&String::from_utf8_lossy(&bytes))
        } else {
            Self::from_der(&bytes)
        }
    }

    /// The certificate compiled into this build via `PKGTRUST_TRUSTED_CERT`
    pub fn embedded() -> Result<Self, SigningError> {
        match EMBEDDED_TRUSTED_CERT {
            Some(body) if !body.trim().is_empty() => Self::from_base64(body),
            _ => Err(SigningError::EmbeddedMissing),
        }
    }

    /// Public key that signer certificates must be signed with
    pub fn public_key(&self) -> &SubjectPublicKeyInfoOwned {
        &self.public_key
    }

    pub fn form(&self) -> TrustedForm {
        self.form
    }

    /// Subject name, when supplied as a full certificate
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Fingerprint of the supplied DER encoding
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Fingerprint of the public key alone
    ///
    /// Identical for a certificate and its extracted public key.
    pub fn key_fingerprint(&self) -> String {
        match self.public_key.to_der() {
            Ok(der) => fingerprint(&der),
            Err(_) => String::from("sha256:unavailable"),
        }
    }

    /// Public key as a `PUBLIC KEY` PEM document
    pub fn public_key_pem(&self) -> Option<String> {
        self.public_key
            .to_der()
            .ok()
            .map(|der| der_to_pem(&der, "PUBLIC KEY"))
    }
}
