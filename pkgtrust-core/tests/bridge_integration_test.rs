//! Integration tests for the bridge surface and descriptor-backed sources

mod common;

use common::*;
use pkgtrust_core::package::DescriptorPackageSource;
use pkgtrust_core::{PackageDetails, PackageInfoModule, TrustConfig, ERR_PACKAGE_INFO};
use std::fs;
use tempfile::TempDir;

/// Write a descriptor plus signer files into a temp project
fn write_build_output(signers: &[(&str, &str)]) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("certs")).unwrap();

    let mut descriptor = String::from(
        "package_name: org.example.wallet\nversion_name: \"1.2.3\"\nversion_code: 45\nsigners:\n",
    );
    for (name, pem) in signers {
        fs::write(temp_dir.path().join("certs").join(name), pem).unwrap();
        descriptor.push_str(&format!("  - certs/{name}\n"));
    }
    fs::write(temp_dir.path().join("package.yml"), descriptor).unwrap();
    fs::write(temp_dir.path().join("release.pem"), TRUSTED_PEM).unwrap();

    temp_dir
}

#[tokio::test]
async fn test_application_startup_flow() {
    // Application root owns the module and hands clones to the bridge
    let module = PackageInfoModule::new();
    let bridge = module.clone();

    assert_eq!(
        bridge.package_info().await.unwrap_err().code,
        ERR_PACKAGE_INFO
    );

    let details = PackageDetails::new(&wallet_source(vec![signer(TRUSTED_PEM)]), &trusted(TRUSTED_PEM));
    module.publish(details).unwrap();

    let first = bridge.package_info().await.unwrap();
    let second = bridge.package_info().await.unwrap();
    assert_eq!(first, second);
    assert!(first.is_official);
}

#[test]
fn test_queries_from_many_threads_agree() {
    let module = PackageInfoModule::with_details(PackageDetails::new(
        &wallet_source(vec![signer(ROGUE_PEM)]),
        &trusted(TRUSTED_PEM),
    ));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let bridge = module.clone();
        handles.push(std::thread::spawn(move || bridge.get_package_info_json()));
    }

    let results: Vec<String> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert!(results[0].contains(r#""isOfficial":false"#));
}

#[test]
fn test_descriptor_with_config_file() {
    let temp_dir = write_build_output(&[("legacy.pem", ROGUE_PEM), ("release.pem", ISSUED_PEM)]);
    let config_path = temp_dir.path().join("pkgtrust.yml");
    fs::write(&config_path, "trusted_certificate_file: release.pem\n").unwrap();

    let source = DescriptorPackageSource::load(&temp_dir.path().join("package.yml")).unwrap();
    let config = TrustConfig::load(&config_path).unwrap();
    let details = PackageDetails::from_config(&source, &config);

    assert!(details.is_official());
    assert_eq!(details.verdict().attempts.len(), 2);
}

#[test]
fn test_descriptor_with_only_foreign_signer() {
    let temp_dir = write_build_output(&[("rogue.pem", ROGUE_PEM)]);

    let source = DescriptorPackageSource::load(&temp_dir.path().join("package.yml")).unwrap();
    let config = TrustConfig::from_file_override(temp_dir.path().join("release.pem"));
    let module = PackageInfoModule::with_details(PackageDetails::from_config(&source, &config));

    let json: serde_json::Value =
        serde_json::from_str(&module.get_package_info_json().unwrap()).unwrap();
    assert_eq!(json["isOfficial"], false);
    assert_eq!(json["packageName"], "org.example.wallet");
    assert_eq!(json["versionCode"], 45);
}

#[test]
fn test_descriptor_with_unreadable_signer_still_checks_the_rest() {
    let temp_dir = write_build_output(&[("release.pem", ISSUED_PEM)]);
    let descriptor_path = temp_dir.path().join("package.yml");
    let descriptor = fs::read_to_string(&descriptor_path)
        .unwrap()
        .replace("signers:\n", "signers:\n  - certs/deleted.pem\n");
    fs::write(&descriptor_path, descriptor).unwrap();

    let source = DescriptorPackageSource::load(&descriptor_path).unwrap();
    let config = TrustConfig::from_file_override(temp_dir.path().join("release.pem"));
    let details = PackageDetails::from_config(&source, &config);

    assert!(details.is_official());
    let labels: Vec<_> = details
        .verdict()
        .attempts
        .iter()
        .map(|attempt| attempt.result.as_ref().map_err(|e| e.label()))
        .collect();
    assert_eq!(labels, vec![Err("malformed"), Ok(&())]);
}
