//! Package metadata error types

use std::path::PathBuf;
use thiserror::Error;

/// Failures reading identity or signers from the host platform
#[derive(Error, Debug)]
pub enum PackageError {
    /// The host does not know the running package
    #[error("Package not found: {package}")]
    NameNotFound { package: String },

    /// The host could not supply the signer certificate list
    #[error("Signing certificates unavailable for {package}: {reason}")]
    SignaturesUnavailable { package: String, reason: String },

    /// Failed to read a package descriptor
    #[error("Failed to read package descriptor from {path}")]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a package descriptor
    #[error("Failed to parse package descriptor {path}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },
}
