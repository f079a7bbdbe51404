//! Shared fixtures for integration tests

#![allow(dead_code)]

use pkgtrust_core::package::{PackageIdentity, SignerCertificate, StaticPackageSource};
use pkgtrust_core::signing::TrustedCertificate;

pub const TRUSTED_PEM: &str = include_str!("../fixtures/release_trusted.pem");
pub const TRUSTED_KEY_PEM: &str = include_str!("../fixtures/release_trusted_pubkey.pem");
pub const ISSUED_PEM: &str = include_str!("../fixtures/release_issued_signer.pem");
pub const ROGUE_PEM: &str = include_str!("../fixtures/rogue_signer.pem");
pub const EC_TRUSTED_PEM: &str = include_str!("../fixtures/ec_trusted.pem");
pub const EC_ISSUED_PEM: &str = include_str!("../fixtures/ec_issued_signer.pem");
pub const RSA1024_PEM: &str = include_str!("../fixtures/algorithms/rsa1024_sha256.pem");
pub const RSA_PSS_PEM: &str = include_str!("../fixtures/algorithms/rsa_pss_sha256.pem");
pub const EC_P256_SHA512_PEM: &str = include_str!("../fixtures/algorithms/ec_p256_sha512.pem");
pub const EC_P521_PEM: &str = include_str!("../fixtures/algorithms/ec_p521_sha512.pem");

pub fn signer(pem: &str) -> SignerCertificate {
    SignerCertificate::from_pem(pem).expect("fixture is valid PEM")
}

pub fn trusted(pem: &str) -> TrustedCertificate {
    TrustedCertificate::from_pem(pem).expect("fixture is a valid trusted certificate")
}

/// Signer whose DER has been cut short
pub fn truncated(pem: &str) -> SignerCertificate {
    let der = signer(pem).as_bytes().to_vec();
    SignerCertificate::from_der(der[..der.len() / 3].to_vec())
}

/// The wallet package from the reference scenarios
pub fn wallet_source(signers: Vec<SignerCertificate>) -> StaticPackageSource {
    StaticPackageSource::new(PackageIdentity::new("org.example.wallet", "1.2.3", 45))
        .with_signers(signers)
}

/// Base64 body of a PEM document, as it would be embedded at build time
pub fn pem_body(pem: &str) -> String {
    pem.lines()
        .filter(|l| !l.starts_with("-----"))
        .collect::<String>()
}
