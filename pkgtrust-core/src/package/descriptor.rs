//! File-backed package source
//!
//! Describes a build output on disk so release tooling can run the same
//! verification the installed app performs at launch:
//!
//! ```yaml
//! package_name: org.example.wallet
//! version_name: "1.2.3"
//! version_code: 45
//! signers:
//!   - certs/release.pem
//! ```
//!
//! Signer paths are resolved relative to the descriptor and may be PEM or DER.
//! A signer file that cannot be read is passed on as an empty certificate, so
//! it fails verification as malformed while its siblings are still checked.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::error::PackageError;
use super::identity::{PackageIdentity, PackageMetadataSource, SignerCertificate};
use crate::signing::encoding::pem_or_der;

/// On-disk package descriptor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    #[serde(flatten)]
    pub identity: PackageIdentity,

    /// Signer certificate files, in the order the host reports them
    #[serde(default)]
    pub signers: Vec<PathBuf>,
}

/// Package source that reads a [`PackageDescriptor`] and its signer files
#[derive(Debug, Clone)]
pub struct DescriptorPackageSource {
    descriptor: PackageDescriptor,
    base_dir: PathBuf,
}

impl DescriptorPackageSource {
    /// Load and parse a descriptor; signer files are read on demand
    pub fn load(path: &Path) -> Result<Self, PackageError> {
        info!("Loading package descriptor from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| PackageError::DescriptorRead {
            path: path.to_path_buf(),
            source,
        })?;
        let descriptor: PackageDescriptor =
            serde_yaml_ng::from_str(&content).map_err(|source| PackageError::DescriptorParse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            "Descriptor for {} lists {} signer(s)",
            descriptor.identity.package_name,
            descriptor.signers.len()
        );

        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(DescriptorPackageSource {
            descriptor,
            base_dir,
        })
    }

    pub fn descriptor(&self) -> &PackageDescriptor {
        &self.descriptor
    }

    fn resolve(&self, signer: &Path) -> PathBuf {
        if signer.is_absolute() {
            signer.to_path_buf()
        } else {
            self.base_dir.join(signer)
        }
    }
}

impl PackageMetadataSource for DescriptorPackageSource {
    fn identity(&self) -> Result<PackageIdentity, PackageError> {
        Ok(self.descriptor.identity.clone())
    }

    fn signing_certificates(&self) -> Result<Vec<SignerCertificate>, PackageError> {
        let signers = self
            .descriptor
            .signers
            .iter()
            .map(|signer| {
                let path = self.resolve(signer);
                match std::fs::read(&path) {
                    Ok(bytes) => SignerCertificate::from_der(pem_or_der(bytes)),
                    Err(e) => {
                        warn!("Signer certificate {} unreadable: {}", path.display(), e);
                        SignerCertificate::from_der(Vec::new())
                    }
                }
            })
            .collect();
        Ok(signers)
    }
}
