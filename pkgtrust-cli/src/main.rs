//! pkgtrust - check release signatures of build outputs
//!
//! Runs the same one-shot verification the installed app performs at
//! launch, against a package descriptor on disk.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pkgtrust_core::details::SignerAttempt;
use pkgtrust_core::package::DescriptorPackageSource;
use pkgtrust_core::{PackageDetails, PackageInfoModule, TrustConfig};

mod trust_cli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "pkgtrust",
    about = "Verify that a package was signed by the trusted release key",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Emit logs as JSON
    #[clap(long, global = true)]
    json_logs: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Verify a package descriptor against the trusted release certificate
    Verify {
        /// Package descriptor (YAML)
        #[clap(long)]
        descriptor: PathBuf,

        /// Trusted certificate file (PEM or DER), overrides config
        #[clap(long)]
        trusted: Option<PathBuf>,

        /// Trust config file (default: ./pkgtrust.yml, then the build-time certificate)
        #[clap(long)]
        config: Option<PathBuf>,

        /// Output the package info record as JSON
        #[clap(long)]
        json: bool,

        /// Strict mode (exit non-zero when the package is not official)
        #[clap(long)]
        strict: bool,
    },

    /// Manage and inspect the trusted release certificate
    Trust {
        #[clap(subcommand)]
        command: trust_cli::TrustCommand,
    },
}

/// Initialize tracing with CLI flags
fn initialize_tracing(log_level: &LogLevel, json_logs: bool) {
    let filter = EnvFilter::new(log_level.to_filter_directive());

    if json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr) // logs to stderr, not stdout
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr) // logs to stderr, not stdout
            .init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    initialize_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Command::Verify {
            descriptor,
            trusted,
            config,
            json,
            strict,
        } => verify_command(descriptor, trusted, config, json, strict).await,
        Command::Trust { command } => command.execute(),
    }
}

// Table row structure for signer display
#[derive(Tabled)]
struct SignerTableRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Fingerprint")]
    fingerprint: String,
    #[tabled(rename = "Result")]
    result: String,
}

impl From<&SignerAttempt> for SignerTableRow {
    fn from(attempt: &SignerAttempt) -> Self {
        SignerTableRow {
            index: attempt.index,
            subject: attempt.subject.clone().unwrap_or_else(|| "-".to_string()),
            fingerprint: attempt.fingerprint.clone(),
            result: match &attempt.result {
                Ok(()) => "verified".to_string(),
                Err(rejection) => rejection.to_string(),
            },
        }
    }
}

async fn verify_command(
    descriptor: PathBuf,
    trusted: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
    strict: bool,
) -> Result<()> {
    debug!("Verifying package descriptor: {:?}", descriptor);

    let source = DescriptorPackageSource::load(&descriptor)
        .with_context(|| format!("Failed to load package descriptor {}", descriptor.display()))?;
    let trust_config = TrustConfig::discover(trusted, config.as_deref())
        .context("Failed to locate the trusted release certificate")?;

    let details = PackageDetails::from_config(&source, &trust_config);
    let module = PackageInfoModule::with_details(details.clone());
    let info = module
        .package_info()
        .await
        .context("Package info unavailable")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        let verdict = details.verdict();
        println!(
            "Package:   {}",
            info.package_name.as_deref().unwrap_or("<unknown>")
        );
        println!(
            "Version:   {} ({})",
            info.version_name.as_deref().unwrap_or("<none>"),
            info.version_code
        );
        println!(
            "Official:  {}",
            if info.is_official { "yes" } else { "no" }
        );
        if let Some(failure) = &verdict.failure {
            println!("Reason:    {failure}");
        }

        let rows: Vec<SignerTableRow> = verdict.attempts.iter().map(SignerTableRow::from).collect();
        if !rows.is_empty() {
            let table = Table::new(&rows)
                .with(Style::rounded())
                .with(Modify::new(Rows::first()).with(Alignment::center()))
                .to_string();
            println!("\n{table}");
        }
    }

    // In strict mode, exit non-zero unless the release key signed the package
    if strict && !info.is_official {
        std::process::exit(1);
    }

    Ok(())
}
