//! Bridge module - the query surface exposed to the application layer
//!
//! The application layer calls into this module through an asynchronous
//! request/response bridge. Verification has already happened by the time a
//! query can arrive, so every call resolves immediately from the cached
//! state; the promise shape is kept so callers never block.
//!
//! Key Design Principles:
//! - No globals: the module is a context object owned by the application
//!   root and cloned into whatever exposes the bridge call
//! - Thread-safe by default (`Arc<OnceLock<..>>`)
//! - Structured `{code, message}` errors, never panics across the bridge
//! - JSON out for foreign-language bindings

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

use crate::details::{PackageDetails, PackageInfo};

/// Error code for queries that cannot be answered from cached state
pub const ERR_PACKAGE_INFO: &str = "ERR_PACKAGE_INFO";

/// Structured error returned across the bridge
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct BridgeError {
    pub code: String,
    pub message: String,
}

impl BridgeError {
    fn not_ready() -> Self {
        BridgeError {
            code: ERR_PACKAGE_INFO.to_string(),
            message: "Error retrieving package info: verification has not completed".to_string(),
        }
    }
}

/// Pending bridge response; already resolved when handed out
pub type PackagePromise = oneshot::Receiver<Result<PackageInfo, BridgeError>>;

/// Bridge module serving the cached package verdict
///
/// Starts empty (`Uninitialized`) and becomes ready once
/// [`PackageInfoModule::publish`] stores the verified [`PackageDetails`].
/// The slot can be filled exactly once.
#[derive(Clone, Default)]
pub struct PackageInfoModule {
    details: Arc<OnceLock<PackageDetails>>,
}

impl PackageInfoModule {
    /// Empty module; queries fail with [`ERR_PACKAGE_INFO`] until published
    pub fn new() -> Self {
        Self::default()
    }

    /// Module that is ready immediately
    pub fn with_details(details: PackageDetails) -> Self {
        let module = Self::new();
        // Fresh slot, cannot already be set
        let _ = module.details.set(details);
        module
    }

    /// Store the verified details
    ///
    /// Returns the rejected details if the module was already published;
    /// the first state stays in place for the rest of the process.
    pub fn publish(&self, details: PackageDetails) -> Result<(), PackageDetails> {
        self.details.set(details).map_err(|rejected| {
            warn!("Package details already published; keeping the first verdict");
            rejected
        })
    }

    /// Bridge module name
    pub fn name(&self) -> &'static str {
        PackageDetails::NAME
    }

    /// Whether verification has completed and been published
    pub fn is_ready(&self) -> bool {
        self.details.get().is_some()
    }

    fn resolve(&self) -> Result<PackageInfo, BridgeError> {
        match self.details.get() {
            Some(details) => Ok(details.query()),
            None => {
                error!("Package info requested before verification completed");
                Err(BridgeError::not_ready())
            }
        }
    }

    /// Query the cached package info
    ///
    /// The returned promise is resolved before this call returns.
    pub fn get_package_info(&self) -> PackagePromise {
        let (tx, rx) = oneshot::channel();
        // The receiver is still held here, so the send cannot fail
        let _ = tx.send(self.resolve());
        rx
    }

    /// Await the cached package info
    pub async fn package_info(&self) -> Result<PackageInfo, BridgeError> {
        match self.get_package_info().await {
            Ok(result) => result,
            Err(_) => Err(BridgeError::not_ready()),
        }
    }

    /// FFI-friendly variant returning JSON or an error string
    pub fn get_package_info_json(&self) -> Result<String, String> {
        let info = self.resolve().map_err(|e| e.to_string())?;
        debug!("Serializing package info for {:?}", info.package_name);
        serde_json::to_string(&info).map_err(|e| format!("Failed to serialize package info: {}", e))
    }
}

// Thread safety assertions - these will fail compilation if not met
const _: () = {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    fn _assertions() {
        assert_send::<PackageInfoModule>();
        assert_sync::<PackageInfoModule>();
        assert_send::<PackageDetails>();
        assert_sync::<PackageDetails>();
    }
};
