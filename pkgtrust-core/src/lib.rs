//! pkgtrust library exports
//!
//! Determines once per launch whether the running package was signed by the
//! organization's release key, and serves that verdict to the application
//! layer.

pub mod bindings;
pub mod config;
pub mod details;
pub mod package;
pub mod signing;

pub use bindings::{BridgeError, PackageInfoModule, ERR_PACKAGE_INFO};
pub use config::TrustConfig;
pub use details::{PackageDetails, PackageInfo, Verdict};
