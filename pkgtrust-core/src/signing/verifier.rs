//! Signer certificate verification
//!
//! Checks that a signer certificate was signed by the trusted release key:
//! the signature over the certificate's TBSCertificate is verified with the
//! trusted public key, using the algorithm the certificate declares. This is
//! a cryptographic check, never a byte comparison of certificates.
//!
//! Supported pairs:
//!
//! | Signature                      | Trusted key                 |
//! |--------------------------------|-----------------------------|
//! | RSA PKCS#1 v1.5 SHA-1/256/512  | RSA 1024..=8192 bits        |
//! | RSA PKCS#1 v1.5 SHA-384        | RSA 2048..=8192 bits        |
//! | RSASSA-PSS SHA-256/384/512     | RSA 2048..=8192 bits        |
//! | ECDSA SHA-256/384/512          | P-256, P-384, P-521         |
//! | Ed25519                        | Ed25519                     |
//!
//! RSASSA-PSS signatures must use MGF1 with the signature hash and a salt
//! as long as the digest. Anything else is reported as unsupported, not as
//! a mismatch.

use aws_lc_rs::signature::{self, VerificationAlgorithm};
use der::asn1::{ObjectIdentifier, UintRef};
use der::{Decode, Encode, Sequence};
use tracing::trace;
use x509_cert::spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use x509_cert::Certificate;

use super::certificate::TrustedCertificate;
use super::error::SignerRejection;

// Signature algorithms
const SHA1_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
const SHA256_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
const SHA384_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
const SHA512_WITH_RSA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");
const RSASSA_PSS: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.10");
const ECDSA_WITH_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
const ECDSA_WITH_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");
const ECDSA_WITH_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");
const ED25519: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");

// Digests and mask generation
const ID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
const ID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
const ID_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
const ID_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");
const ID_MGF1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.8");

// Key types and curves
const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

const RSA_MIN_BITS: usize = 1024;
const RSA_MAX_BITS: usize = 8192;

/// PKCS#1 `RSAPublicKey`
#[derive(Sequence)]
struct RsaPublicKey<'a> {
    modulus: UintRef<'a>,
    public_exponent: UintRef<'a>,
}

/// PKCS#1 `RSASSA-PSS-params`; absent fields take their ASN.1 defaults
#[derive(Sequence)]
struct PssParams {
    #[asn1(context_specific = "0", optional = "true")]
    hash: Option<AlgorithmIdentifierOwned>,
    #[asn1(context_specific = "1", optional = "true")]
    mask_gen: Option<AlgorithmIdentifierOwned>,
    #[asn1(context_specific = "2", optional = "true")]
    salt_length: Option<u32>,
    #[asn1(context_specific = "3", optional = "true")]
    trailer_field: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hash {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl Hash {
    fn from_oid(oid: ObjectIdentifier) -> Result<Self, SignerRejection> {
        match oid {
            ID_SHA1 => Ok(Hash::Sha1),
            ID_SHA256 => Ok(Hash::Sha256),
            ID_SHA384 => Ok(Hash::Sha384),
            ID_SHA512 => Ok(Hash::Sha512),
            other => Err(SignerRejection::Unsupported(format!("digest {other}"))),
        }
    }

    fn output_len(self) -> u32 {
        match self {
            Hash::Sha1 => 20,
            Hash::Sha256 => 32,
            Hash::Sha384 => 48,
            Hash::Sha512 => 64,
        }
    }
}

/// Signature scheme a certificate declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scheme {
    RsaPkcs1(Hash),
    RsaPss(Hash),
    Ecdsa(Hash),
    Ed25519,
}

/// Key families the trusted key may belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Rsa { bits: usize },
    EcP256,
    EcP384,
    EcP521,
    Ed25519,
}

fn rsa_modulus_bits(key: &SubjectPublicKeyInfoOwned) -> Result<usize, SignerRejection> {
    let rsa_key = key
        .subject_public_key
        .as_bytes()
        .ok_or_else(|| SignerRejection::Unsupported("RSA key with unused bits".to_string()))
        .and_then(|bytes| {
            RsaPublicKey::from_der(bytes)
                .map_err(|e| SignerRejection::Unsupported(format!("unreadable RSA key: {e}")))
        })?;

    let modulus = rsa_key.modulus.as_bytes();
    Ok(match modulus.first() {
        Some(top) => (modulus.len() - 1) * 8 + (8 - top.leading_zeros() as usize),
        None => 0,
    })
}

fn key_kind(key: &SubjectPublicKeyInfoOwned) -> Result<KeyKind, SignerRejection> {
    let oid = key.algorithm.oid;

    // An rsassaPss key carries the same RSAPublicKey as rsaEncryption
    if oid == RSA_ENCRYPTION || oid == RSASSA_PSS {
        let bits = rsa_modulus_bits(key)?;
        if !(RSA_MIN_BITS..=RSA_MAX_BITS).contains(&bits) {
            return Err(SignerRejection::Unsupported(format!("{bits}-bit RSA key")));
        }
        return Ok(KeyKind::Rsa { bits });
    }
    if oid == ED25519 {
        return Ok(KeyKind::Ed25519);
    }
    if oid == EC_PUBLIC_KEY {
        let curve = key
            .algorithm
            .parameters
            .as_ref()
            .and_then(|params| params.decode_as::<ObjectIdentifier>().ok());
        return match curve {
            Some(c) if c == SECP256R1 => Ok(KeyKind::EcP256),
            Some(c) if c == SECP384R1 => Ok(KeyKind::EcP384),
            Some(c) if c == SECP521R1 => Ok(KeyKind::EcP521),
            Some(c) => Err(SignerRejection::Unsupported(format!("EC curve {c}"))),
            None => Err(SignerRejection::Unsupported(
                "EC key without named curve".to_string(),
            )),
        };
    }

    Err(SignerRejection::Unsupported(format!("key algorithm {oid}")))
}

/// Read the hash out of `RSASSA-PSS-params`
fn pss_hash(algorithm: &AlgorithmIdentifierOwned) -> Result<Hash, SignerRejection> {
    let params: PssParams = match &algorithm.parameters {
        Some(params) => params
            .decode_as()
            .map_err(|e| SignerRejection::Malformed(format!("RSASSA-PSS parameters: {e}")))?,
        None => {
            return Err(SignerRejection::Unsupported(
                "RSASSA-PSS with default SHA-1 parameters".to_string(),
            ))
        }
    };

    let hash = match &params.hash {
        Some(hash) => Hash::from_oid(hash.oid)?,
        None => Hash::Sha1,
    };
    let mgf_hash = match &params.mask_gen {
        Some(mgf) if mgf.oid == ID_MGF1 => {
            let inner: AlgorithmIdentifierOwned = mgf
                .parameters
                .as_ref()
                .ok_or_else(|| SignerRejection::Malformed("MGF1 without digest".to_string()))?
                .decode_as()
                .map_err(|e| SignerRejection::Malformed(format!("MGF1 parameters: {e}")))?;
            Hash::from_oid(inner.oid)?
        }
        Some(mgf) => {
            return Err(SignerRejection::Unsupported(format!(
                "mask generation function {}",
                mgf.oid
            )))
        }
        None => Hash::Sha1,
    };
    let salt_length = params.salt_length.unwrap_or(20);

    if mgf_hash != hash {
        return Err(SignerRejection::Unsupported(format!(
            "RSASSA-PSS with {hash:?} and MGF1 {mgf_hash:?}"
        )));
    }
    if salt_length != hash.output_len() {
        return Err(SignerRejection::Unsupported(format!(
            "RSASSA-PSS {hash:?} with {salt_length}-byte salt"
        )));
    }
    if params.trailer_field.unwrap_or(1) != 1 {
        return Err(SignerRejection::Unsupported(
            "RSASSA-PSS trailer field".to_string(),
        ));
    }

    Ok(hash)
}

fn signature_scheme(algorithm: &AlgorithmIdentifierOwned) -> Result<Scheme, SignerRejection> {
    match algorithm.oid {
        SHA1_WITH_RSA => Ok(Scheme::RsaPkcs1(Hash::Sha1)),
        SHA256_WITH_RSA => Ok(Scheme::RsaPkcs1(Hash::Sha256)),
        SHA384_WITH_RSA => Ok(Scheme::RsaPkcs1(Hash::Sha384)),
        SHA512_WITH_RSA => Ok(Scheme::RsaPkcs1(Hash::Sha512)),
        RSASSA_PSS => Ok(Scheme::RsaPss(pss_hash(algorithm)?)),
        ECDSA_WITH_SHA256 => Ok(Scheme::Ecdsa(Hash::Sha256)),
        ECDSA_WITH_SHA384 => Ok(Scheme::Ecdsa(Hash::Sha384)),
        ECDSA_WITH_SHA512 => Ok(Scheme::Ecdsa(Hash::Sha512)),
        ED25519 => Ok(Scheme::Ed25519),
        other => Err(SignerRejection::Unsupported(format!(
            "signature algorithm {other}"
        ))),
    }
}

/// Pick the verification algorithm for a (signature scheme, trusted key) pair
fn verification_algorithm(
    scheme: Scheme,
    key: KeyKind,
) -> Result<&'static dyn VerificationAlgorithm, SignerRejection> {
    let algorithm: &'static dyn VerificationAlgorithm = match (scheme, key) {
        (Scheme::RsaPkcs1(Hash::Sha1), KeyKind::Rsa { .. }) => {
            &signature::RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY
        }
        (Scheme::RsaPkcs1(Hash::Sha256), KeyKind::Rsa { bits }) if bits < 2048 => {
            &signature::RSA_PKCS1_1024_8192_SHA256_FOR_LEGACY_USE_ONLY
        }
        (Scheme::RsaPkcs1(Hash::Sha256), KeyKind::Rsa { .. }) => &signature::RSA_PKCS1_2048_8192_SHA256,
        (Scheme::RsaPkcs1(Hash::Sha384), KeyKind::Rsa { bits }) if bits >= 2048 => {
            &signature::RSA_PKCS1_2048_8192_SHA384
        }
        (Scheme::RsaPkcs1(Hash::Sha512), KeyKind::Rsa { bits }) if bits < 2048 => {
            &signature::RSA_PKCS1_1024_8192_SHA512_FOR_LEGACY_USE_ONLY
        }
        (Scheme::RsaPkcs1(Hash::Sha512), KeyKind::Rsa { .. }) => &signature::RSA_PKCS1_2048_8192_SHA512,
        (Scheme::RsaPss(Hash::Sha256), KeyKind::Rsa { bits }) if bits >= 2048 => {
            &signature::RSA_PSS_2048_8192_SHA256
        }
        (Scheme::RsaPss(Hash::Sha384), KeyKind::Rsa { bits }) if bits >= 2048 => {
            &signature::RSA_PSS_2048_8192_SHA384
        }
        (Scheme::RsaPss(Hash::Sha512), KeyKind::Rsa { bits }) if bits >= 2048 => {
            &signature::RSA_PSS_2048_8192_SHA512
        }
        (Scheme::Ecdsa(Hash::Sha256), KeyKind::EcP256) => &signature::ECDSA_P256_SHA256_ASN1,
        (Scheme::Ecdsa(Hash::Sha384), KeyKind::EcP256) => &signature::ECDSA_P256_SHA384_ASN1,
        (Scheme::Ecdsa(Hash::Sha512), KeyKind::EcP256) => &signature::ECDSA_P256_SHA512_ASN1,
        (Scheme::Ecdsa(Hash::Sha256), KeyKind::EcP384) => &signature::ECDSA_P384_SHA256_ASN1,
        (Scheme::Ecdsa(Hash::Sha384), KeyKind::EcP384) => &signature::ECDSA_P384_SHA384_ASN1,
        (Scheme::Ecdsa(Hash::Sha512), KeyKind::EcP384) => &signature::ECDSA_P384_SHA512_ASN1,
        (Scheme::Ecdsa(Hash::Sha256), KeyKind::EcP521) => &signature::ECDSA_P521_SHA256_ASN1,
        (Scheme::Ecdsa(Hash::Sha384), KeyKind::EcP521) => &signature::ECDSA_P521_SHA384_ASN1,
        (Scheme::Ecdsa(Hash::Sha512), KeyKind::EcP521) => &signature::ECDSA_P521_SHA512_ASN1,
        (Scheme::Ed25519, KeyKind::Ed25519) => &signature::ED25519,
        _ => {
            return Err(SignerRejection::Unsupported(format!(
                "{scheme:?} signature with {key:?} trusted key"
            )))
        }
    };
    Ok(algorithm)
}

/// Parse a signer certificate, returning its subject for diagnostics
pub fn signer_subject(der: &[u8]) -> Option<String> {
    Certificate::from_der(der)
        .ok()
        .map(|cert| cert.tbs_certificate.subject.to_string())
}

/// Verify that `signer_der` is signed by the trusted release key
///
/// Returns `Ok(())` only when the certificate parses and its signature
/// validates under the trusted public key.
pub fn verify_signer(signer_der: &[u8], trusted: &TrustedCertificate) -> Result<(), SignerRejection> {
    let cert = Certificate::from_der(signer_der)
        .map_err(|e| SignerRejection::Malformed(e.to_string()))?;

    let signed_bytes = cert
        .tbs_certificate
        .to_der()
        .map_err(|e| SignerRejection::Malformed(format!("TBSCertificate re-encoding failed: {e}")))?;

    let scheme = signature_scheme(&cert.signature_algorithm)?;
    let key = trusted.public_key();
    let algorithm = verification_algorithm(scheme, key_kind(key)?)?;

    trace!(
        "Checking signer '{}' ({:?}) against trusted key",
        cert.tbs_certificate.subject,
        scheme
    );

    signature::UnparsedPublicKey::new(algorithm, key.subject_public_key.raw_bytes())
        .verify(&signed_bytes, cert.signature.raw_bytes())
        .map_err(|_| SignerRejection::Mismatch)
}
