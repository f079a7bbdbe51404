//! Trusted-material configuration
//!
//! Locates the release certificate the verifier trusts. Resolution order:
//! 1. Explicit trusted-certificate file (CLI `--trusted`)
//! 2. Explicit config file, or `pkgtrust.yml` in the current directory
//! 3. The certificate compiled in through `PKGTRUST_TRUSTED_CERT`
//!
//! Material is validated when the config is resolved, so a bad build
//! constant shows up at configuration time rather than as a silent
//! "not official" verdict on every launch.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::signing::{SigningError, TrustedCertificate, EMBEDDED_TRUSTED_CERT};

/// Default config file name looked up in the current directory
pub const CONFIG_FILE_NAME: &str = "pkgtrust.yml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Config sets both trusted_certificate and trusted_certificate_file; use exactly one")]
    Conflicting,

    #[error("No trusted certificate configured.\n\nPass --trusted <file>, add trusted_certificate to pkgtrust.yml, or build with PKGTRUST_TRUSTED_CERT set.")]
    Missing,

    #[error(transparent)]
    Trusted(#[from] SigningError),
}

/// Where the trusted release certificate comes from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Base64 body of a PEM block (certificate or public key)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_certificate: Option<String>,

    /// PEM or DER file, relative to the config file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trusted_certificate_file: Option<PathBuf>,

    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl TrustConfig {
    /// Load a YAML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading trust config from {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: TrustConfig =
            serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if config.trusted_certificate.is_some() && config.trusted_certificate_file.is_some() {
            return Err(ConfigError::Conflicting);
        }

        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Config pointing at a trusted certificate file
    pub fn from_file_override(path: PathBuf) -> Self {
        TrustConfig {
            trusted_certificate_file: Some(path),
            ..Default::default()
        }
    }

    /// Config holding an inline base64 body
    pub fn inline(body: impl Into<String>) -> Self {
        TrustConfig {
            trusted_certificate: Some(body.into()),
            ..Default::default()
        }
    }

    /// Config backed by the build-time constant, if one was compiled in
    pub fn embedded() -> Option<Self> {
        EMBEDDED_TRUSTED_CERT
            .filter(|body| !body.trim().is_empty())
            .map(Self::inline)
    }

    /// Discover the trust config following the documented resolution order
    pub fn discover(
        override_file: Option<PathBuf>,
        config_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        if let Some(file) = override_file {
            debug!("Using trusted certificate override: {}", file.display());
            return Ok(Self::from_file_override(file));
        }

        if let Some(path) = config_path {
            info!("Using trust config: {}", path.display());
            return Self::load(path);
        }

        let local = Path::new(CONFIG_FILE_NAME);
        if local.is_file() {
            info!("Found {} in current directory", CONFIG_FILE_NAME);
            return Self::load(local);
        }

        match Self::embedded() {
            Some(config) => {
                debug!("Using trusted certificate embedded at build time");
                Ok(config)
            }
            None => Err(ConfigError::Missing),
        }
    }

    /// Validate and resolve the configured material into a trusted key
    pub fn resolve(&self) -> Result<TrustedCertificate, ConfigError> {
        match (&self.trusted_certificate, &self.trusted_certificate_file) {
            (Some(_), Some(_)) => Err(ConfigError::Conflicting),
            (Some(body), None) => Ok(TrustedCertificate::from_base64(body)?),
            (None, Some(file)) => {
                let path = match &self.base_dir {
                    Some(base) if file.is_relative() => base.join(file),
                    _ => file.clone(),
                };
                Ok(TrustedCertificate::from_file(&path)?)
            }
            (None, None) => Err(ConfigError::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::TrustedForm;
    use std::fs;
    use tempfile::TempDir;

    const TRUSTED_PEM: &str = include_str!("../tests/fixtures/release_trusted.pem");
    const TRUSTED_KEY_PEM: &str = include_str!("../tests/fixtures/release_trusted_pubkey.pem");

    fn pem_body(pem: &str) -> String {
        pem.lines()
            .filter(|l| !l.starts_with("-----"))
            .collect::<String>()
    }

    #[test]
    fn test_inline_certificate_body() {
        let trusted = TrustConfig::inline(pem_body(TRUSTED_PEM)).resolve().unwrap();
        assert_eq!(trusted.form(), TrustedForm::Certificate);
    }

    #[test]
    fn test_inline_public_key_body() {
        let trusted = TrustConfig::inline(pem_body(TRUSTED_KEY_PEM)).resolve().unwrap();
        assert_eq!(trusted.form(), TrustedForm::PublicKey);
    }

    #[test]
    fn test_invalid_inline_body_is_rejected_at_resolve() {
        let result = TrustConfig::inline("AAAA").resolve();
        assert!(matches!(result, Err(ConfigError::Trusted(_))));
    }

    #[test]
    fn test_file_relative_to_config() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("keys")).unwrap();
        fs::write(temp_dir.path().join("keys/release.pem"), TRUSTED_PEM).unwrap();
        let config_path = temp_dir.path().join("pkgtrust.yml");
        fs::write(&config_path, "trusted_certificate_file: keys/release.pem\n").unwrap();

        let config = TrustConfig::load(&config_path).unwrap();
        let trusted = config.resolve().unwrap();
        assert!(trusted.subject().unwrap().contains("Example Wallet Release"));
    }

    #[test]
    fn test_conflicting_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("pkgtrust.yml");
        fs::write(
            &config_path,
            "trusted_certificate: AAAA\ntrusted_certificate_file: release.pem\n",
        )
        .unwrap();

        assert!(matches!(
            TrustConfig::load(&config_path),
            Err(ConfigError::Conflicting)
        ));
    }

    #[test]
    fn test_empty_config_is_missing() {
        assert!(matches!(
            TrustConfig::default().resolve(),
            Err(ConfigError::Missing)
        ));
    }

    #[test]
    fn test_discover_prefers_override() {
        let temp_dir = TempDir::new().unwrap();
        let cert_path = temp_dir.path().join("release.pem");
        fs::write(&cert_path, TRUSTED_PEM).unwrap();
        let config_path = temp_dir.path().join("other.yml");
        fs::write(&config_path, "trusted_certificate: AAAA\n").unwrap();

        let config = TrustConfig::discover(Some(cert_path.clone()), Some(&config_path)).unwrap();
        assert_eq!(config, TrustConfig::from_file_override(cert_path));
        assert!(config.resolve().is_ok());
    }

    #[test]
    fn test_discover_uses_config_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("other.yml");
        fs::write(
            &config_path,
            format!("trusted_certificate: {}\n", pem_body(TRUSTED_PEM)),
        )
        .unwrap();

        let config = TrustConfig::discover(None, Some(&config_path)).unwrap();
        assert!(config.trusted_certificate.is_some());
        assert!(config.resolve().is_ok());
    }
}
