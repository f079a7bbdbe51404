//! Release-signature verification
//!
//! Decides whether a signer certificate attached to the running package was
//! issued by the organization's release key.
//!
//! - The trusted material is resolved once into a public key
//!   ([`TrustedCertificate`]); malformed material is rejected there, not
//!   during verification.
//! - Each signer is checked independently ([`verify_signer`]) and yields a
//!   typed result, so callers can log why a candidate failed.
//! - Supported: RSA PKCS#1 v1.5 (SHA-1/256/384/512), ECDSA P-256/P-384, Ed25519.

pub mod certificate;
pub mod encoding;
pub mod error;
pub mod verifier;

pub use certificate::{TrustedCertificate, TrustedForm, EMBEDDED_TRUSTED_CERT};
pub use error::{SignerRejection, SigningError};
pub use verifier::{signer_subject, verify_signer};
