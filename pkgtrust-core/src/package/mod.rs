//! Package metadata accessors
//!
//! The host platform supplies the running package's identity and signer
//! certificates through [`PackageMetadataSource`].

pub mod descriptor;
pub mod error;
pub mod identity;

pub use descriptor::{DescriptorPackageSource, PackageDescriptor};
pub use error::PackageError;
pub use identity::{PackageIdentity, PackageMetadataSource, SignerCertificate, StaticPackageSource};
