//! Installed package identity and the host accessor that supplies it

use serde::{Deserialize, Serialize};

use super::error::PackageError;
use crate::signing::encoding::{fingerprint, pem_to_der};

/// Identity fields of the running binary, stored verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageIdentity {
    /// Package or bundle identifier
    pub package_name: String,

    /// Human-readable version label; some hosts do not report one
    #[serde(default)]
    pub version_name: Option<String>,

    /// Numeric build/version code
    #[serde(default)]
    pub version_code: i64,
}

impl PackageIdentity {
    pub fn new(
        package_name: impl Into<String>,
        version_name: impl Into<String>,
        version_code: i64,
    ) -> Self {
        PackageIdentity {
            package_name: package_name.into(),
            version_name: Some(version_name.into()),
            version_code,
        }
    }
}

/// Raw DER bytes of one signer certificate attached to the binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerCertificate(Vec<u8>);

impl SignerCertificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        SignerCertificate(der.into())
    }

    /// Decode a PEM document; `None` when no PEM body is present
    pub fn from_pem(pem: &str) -> Option<Self> {
        pem_to_der(pem).map(SignerCertificate)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.0)
    }
}

impl AsRef<[u8]> for SignerCertificate {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Host platform accessor for the running package
///
/// Identity and signers are separate calls so a signer lookup failure does
/// not discard identity fields that were read successfully. Implementations
/// are expected to be synchronous and cheap.
pub trait PackageMetadataSource {
    /// Identifier, version label and version code of the running package
    fn identity(&self) -> Result<PackageIdentity, PackageError>;

    /// Signer certificates attached to the running package (zero or more)
    fn signing_certificates(&self) -> Result<Vec<SignerCertificate>, PackageError>;
}

/// In-memory source for values handed over by host glue code
#[derive(Debug, Clone)]
pub struct StaticPackageSource {
    package_name: String,
    identity: Option<PackageIdentity>,
    signers: Option<Vec<SignerCertificate>>,
}

impl StaticPackageSource {
    /// Source with the given identity and no signers yet
    pub fn new(identity: PackageIdentity) -> Self {
        StaticPackageSource {
            package_name: identity.package_name.clone(),
            identity: Some(identity),
            signers: Some(Vec::new()),
        }
    }

    /// Source whose identity lookup fails, as for an unknown package name
    pub fn missing(package_name: impl Into<String>) -> Self {
        StaticPackageSource {
            package_name: package_name.into(),
            identity: None,
            signers: None,
        }
    }

    pub fn with_signer(mut self, signer: SignerCertificate) -> Self {
        self.signers.get_or_insert_with(Vec::new).push(signer);
        self
    }

    pub fn with_signers(mut self, signers: impl IntoIterator<Item = SignerCertificate>) -> Self {
        self.signers.get_or_insert_with(Vec::new).extend(signers);
        self
    }

    /// Make the signer lookup fail while identity still resolves
    pub fn without_signatures(mut self) -> Self {
        self.signers = None;
        self
    }
}

impl PackageMetadataSource for StaticPackageSource {
    fn identity(&self) -> Result<PackageIdentity, PackageError> {
        self.identity.clone().ok_or_else(|| PackageError::NameNotFound {
            package: self.package_name.clone(),
        })
    }

    fn signing_certificates(&self) -> Result<Vec<SignerCertificate>, PackageError> {
        self.signers
            .clone()
            .ok_or_else(|| PackageError::SignaturesUnavailable {
                package: self.package_name.clone(),
                reason: "signing information not reported by host".to_string(),
            })
    }
}
