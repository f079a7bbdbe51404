//! Package details - one-shot authenticity verdict for the running package
//!
//! Verification runs exactly once, when [`PackageDetails`] is constructed.
//! Every failure along the way (unknown package, missing signers, bad trusted
//! material, malformed certificates) is logged and folded into the verdict;
//! construction itself never fails. Afterwards the state is immutable and
//! [`PackageDetails::query`] is a plain read.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::TrustConfig;
use crate::package::{PackageMetadataSource, SignerCertificate};
use crate::signing::{signer_subject, verify_signer, SignerRejection, TrustedCertificate};

/// Record handed to the application layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub package_name: Option<String>,
    pub version_name: Option<String>,
    pub version_code: i64,
    pub is_official: bool,
}

/// Why no signer could be checked at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerdictFailure {
    #[error("package identity unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("signing certificates unavailable: {0}")]
    SignersUnavailable(String),

    #[error("trusted certificate unavailable: {0}")]
    TrustAnchorUnavailable(String),

    #[error("package reports no signing certificates")]
    NoSigners,
}

/// Outcome of checking one signer certificate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerAttempt {
    /// Position in the host-reported signer list
    pub index: usize,
    pub fingerprint: String,
    pub subject: Option<String>,
    pub result: Result<(), SignerRejection>,
}

impl SignerAttempt {
    fn check(index: usize, signer: &SignerCertificate, trusted: &TrustedCertificate) -> Self {
        SignerAttempt {
            index,
            fingerprint: signer.fingerprint(),
            subject: signer_subject(signer.as_bytes()),
            result: verify_signer(signer.as_bytes(), trusted),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.result.is_ok()
    }
}

/// The authenticity verdict and the evidence behind it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub is_official: bool,

    /// Signers checked, in order, up to and including the first success
    pub attempts: Vec<SignerAttempt>,

    /// Set when verification could not run against any signer
    pub failure: Option<VerdictFailure>,
}

impl Verdict {
    fn failed(failure: VerdictFailure) -> Self {
        Verdict {
            is_official: false,
            attempts: Vec::new(),
            failure: Some(failure),
        }
    }

    /// Check signers in order, stopping at the first one that verifies
    ///
    /// The verdict is the logical OR of the attempts: one valid signer is
    /// enough, whatever the others look like.
    fn from_signers(signers: &[SignerCertificate], trusted: &TrustedCertificate) -> Self {
        if signers.is_empty() {
            return Verdict::failed(VerdictFailure::NoSigners);
        }

        let mut attempts = Vec::with_capacity(signers.len());
        for (index, signer) in signers.iter().enumerate() {
            let attempt = SignerAttempt::check(index, signer, trusted);
            match &attempt.result {
                Ok(()) => debug!("Signer #{} verified ({})", index, attempt.fingerprint),
                Err(rejection) => debug!(
                    "Signer #{} rejected ({}): {}",
                    index, attempt.fingerprint, rejection
                ),
            }
            let verified = attempt.is_verified();
            attempts.push(attempt);
            if verified {
                break;
            }
        }

        Verdict {
            is_official: attempts.iter().any(SignerAttempt::is_verified),
            attempts,
            failure: None,
        }
    }
}

/// Immutable per-process state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageState {
    pub package_name: Option<String>,
    pub version_name: Option<String>,
    pub version_code: i64,
    pub verdict: Verdict,
}

/// Verified package details, computed once at construction
#[derive(Debug, Clone)]
pub struct PackageDetails {
    state: Arc<PackageState>,
}

impl PackageDetails {
    /// Name the bridge module is registered under
    pub const NAME: &'static str = "PackageDetails";

    /// Verify the running package against `trusted`
    pub fn new<S>(source: &S, trusted: &TrustedCertificate) -> Self
    where
        S: PackageMetadataSource + ?Sized,
    {
        Self::initialize(source, Ok(trusted))
    }

    /// Resolve the trusted material from `config`, then verify
    ///
    /// Unresolvable material yields a "not official" verdict rather than an
    /// error.
    pub fn from_config<S>(source: &S, config: &TrustConfig) -> Self
    where
        S: PackageMetadataSource + ?Sized,
    {
        match config.resolve() {
            Ok(trusted) => Self::initialize(source, Ok(&trusted)),
            Err(e) => Self::initialize(source, Err(e.to_string())),
        }
    }

    /// Verify against the certificate compiled into this build
    pub fn with_embedded_trust<S>(source: &S) -> Self
    where
        S: PackageMetadataSource + ?Sized,
    {
        match TrustedCertificate::embedded() {
            Ok(trusted) => Self::initialize(source, Ok(&trusted)),
            Err(e) => Self::initialize(source, Err(e.to_string())),
        }
    }

    fn initialize<S>(source: &S, trusted: Result<&TrustedCertificate, String>) -> Self
    where
        S: PackageMetadataSource + ?Sized,
    {
        info!("Verifying package signing certificates");

        let identity = source.identity().map_err(|e| {
            error!("Package identity unavailable: {}", e);
            e.to_string()
        });

        let verdict = match (&identity, trusted) {
            (Err(reason), _) => Verdict::failed(VerdictFailure::IdentityUnavailable(reason.clone())),
            (Ok(_), Err(reason)) => {
                error!("Trusted certificate unavailable: {}", reason);
                Verdict::failed(VerdictFailure::TrustAnchorUnavailable(reason))
            }
            (Ok(_), Ok(trusted)) => match source.signing_certificates() {
                Ok(signers) => Verdict::from_signers(&signers, trusted),
                Err(e) => {
                    error!("Error reading signing certificates: {}", e);
                    Verdict::failed(VerdictFailure::SignersUnavailable(e.to_string()))
                }
            },
        };

        let state = match identity.ok() {
            Some(identity) => PackageState {
                package_name: Some(identity.package_name),
                version_name: identity.version_name,
                version_code: identity.version_code,
                verdict,
            },
            None => PackageState {
                package_name: None,
                version_name: None,
                version_code: 0,
                verdict,
            },
        };

        if state.verdict.is_official {
            info!(
                "Package verification completed. isOfficial: true, packageName: {:?}",
                state.package_name
            );
        } else {
            warn!(
                "Package verification completed. isOfficial: false, packageName: {:?}",
                state.package_name
            );
            error!(target: "security", "Package is not signed by the trusted release key: {:?}", state.package_name);
        }

        PackageDetails {
            state: Arc::new(state),
        }
    }

    /// Snapshot of the cached state; performs no verification
    pub fn query(&self) -> PackageInfo {
        PackageInfo {
            package_name: self.state.package_name.clone(),
            version_name: self.state.version_name.clone(),
            version_code: self.state.version_code,
            is_official: self.state.verdict.is_official,
        }
    }

    pub fn is_official(&self) -> bool {
        self.state.verdict.is_official
    }

    pub fn verdict(&self) -> &Verdict {
        &self.state.verdict
    }

    pub fn state(&self) -> &PackageState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{PackageError, PackageIdentity, StaticPackageSource};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    const TRUSTED_PEM: &str = include_str!("../tests/fixtures/release_trusted.pem");
    const ROGUE_PEM: &str = include_str!("../tests/fixtures/rogue_signer.pem");

    fn signer(pem: &str) -> SignerCertificate {
        SignerCertificate::from_pem(pem).unwrap()
    }

    fn trusted() -> TrustedCertificate {
        TrustedCertificate::from_pem(TRUSTED_PEM).unwrap()
    }

    /// Counts accessor calls to prove verification runs once
    struct CountingSource {
        inner: StaticPackageSource,
        identity_calls: Cell<usize>,
        signer_calls: Cell<usize>,
    }

    impl PackageMetadataSource for CountingSource {
        fn identity(&self) -> Result<PackageIdentity, PackageError> {
            self.identity_calls.set(self.identity_calls.get() + 1);
            self.inner.identity()
        }

        fn signing_certificates(&self) -> Result<Vec<SignerCertificate>, PackageError> {
            self.signer_calls.set(self.signer_calls.get() + 1);
            self.inner.signing_certificates()
        }
    }

    #[test]
    fn test_query_does_not_reverify() {
        let source = CountingSource {
            inner: StaticPackageSource::new(PackageIdentity::new("org.example.wallet", "1.2.3", 45))
                .with_signer(signer(TRUSTED_PEM)),
            identity_calls: Cell::new(0),
            signer_calls: Cell::new(0),
        };

        let details = PackageDetails::new(&source, &trusted());
        let first = details.query();
        for _ in 0..10 {
            assert_eq!(details.query(), first);
        }

        assert_eq!(source.identity_calls.get(), 1);
        assert_eq!(source.signer_calls.get(), 1);
    }

    #[test]
    fn test_short_circuits_on_first_verified_signer() {
        let source = StaticPackageSource::new(PackageIdentity::new("org.example.wallet", "1.2.3", 45))
            .with_signers(vec![
                signer(ROGUE_PEM),
                signer(TRUSTED_PEM),
                signer(ROGUE_PEM),
            ]);

        let details = PackageDetails::new(&source, &trusted());
        let verdict = details.verdict();

        assert!(verdict.is_official);
        assert_eq!(verdict.attempts.len(), 2);
        assert_eq!(verdict.attempts[0].result, Err(SignerRejection::Mismatch));
        assert_eq!(verdict.attempts[1].index, 1);
        assert!(verdict.attempts[1].is_verified());
    }

    #[test]
    fn test_identity_failure_leaves_fields_unset() {
        let source = StaticPackageSource::missing("org.example.wallet");
        let details = PackageDetails::new(&source, &trusted());

        assert_eq!(
            details.query(),
            PackageInfo {
                package_name: None,
                version_name: None,
                version_code: 0,
                is_official: false,
            }
        );
        assert!(matches!(
            details.verdict().failure,
            Some(VerdictFailure::IdentityUnavailable(_))
        ));
    }

    #[test]
    fn test_invalid_trust_config_is_not_official() {
        let source = StaticPackageSource::new(PackageIdentity::new("org.example.wallet", "1.2.3", 45))
            .with_signer(signer(TRUSTED_PEM));

        let details = PackageDetails::from_config(&source, &TrustConfig::inline("AAAA"));

        assert!(!details.is_official());
        assert_eq!(details.query().package_name.as_deref(), Some("org.example.wallet"));
        assert!(matches!(
            details.verdict().failure,
            Some(VerdictFailure::TrustAnchorUnavailable(_))
        ));
    }

    #[test]
    fn test_missing_embedded_certificate_is_not_official() {
        // Test builds do not set PKGTRUST_TRUSTED_CERT
        if crate::signing::EMBEDDED_TRUSTED_CERT.is_some() {
            return;
        }
        let source = StaticPackageSource::new(PackageIdentity::new("org.example.wallet", "1.2.3", 45))
            .with_signer(signer(TRUSTED_PEM));

        let details = PackageDetails::with_embedded_trust(&source);
        assert!(!details.is_official());
        assert!(matches!(
            details.verdict().failure,
            Some(VerdictFailure::TrustAnchorUnavailable(_))
        ));
    }

    #[test]
    fn test_package_info_json_shape() {
        let info = PackageInfo {
            package_name: Some("org.example.wallet".to_string()),
            version_name: Some("1.2.3".to_string()),
            version_code: 45,
            is_official: true,
        };
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({
                "packageName": "org.example.wallet",
                "versionName": "1.2.3",
                "versionCode": 45,
                "isOfficial": true
            })
        );
    }
}
