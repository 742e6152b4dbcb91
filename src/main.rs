//! sbom-join: SBOM identity resolution and inventory join tool
//!
//! Resolves dependency graphs of `CycloneDX`, SPDX and Syft documents and joins
//! declared and discovered inventories into one.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sbom_join::{
    cli::{self, InventoryInputs},
    config::{AppConfig, CliOverrides, OutputFormat},
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Build long version string with format support info
const fn build_long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\n\nSupported SBOM Formats:",
        "\n  CycloneDX: 1.4, 1.5, 1.6 (JSON, XML)",
        "\n  SPDX:      2.2, 2.3 (JSON, tag-value, YAML)",
        "\n  Syft:      JSON",
        "\n\nOutput Formats:",
        "\n  json, summary"
    )
}

#[derive(Parser)]
#[command(name = "sbom-join")]
#[command(version, long_version = build_long_version())]
#[command(about = "Resolve and join SBOM inventories", long_about = None)]
#[command(after_help = "EXIT CODES:
    0  Success
    1  Error occurred

EXAMPLES:
    # Join a lockfile SBOM with a container scan
    sbom-join inventory --declared app.cdx.json --discovered image.syft.json

    # Short summary instead of JSON
    sbom-join inventory --declared app.spdx.json -o summary

    # Join and check for known vulnerabilities
    sbom-join scan --declared app.cdx.json --discovered image.syft.json

    # Scan, marking findings a vendor VEX declares not affected
    sbom-join scan --declared app.cdx.json --vex vendor.openvex.json")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by `inventory` and `scan`
#[derive(Parser)]
struct InventoryArgs {
    /// Declaration SBOMs (manifests, lockfiles); authoritative
    #[arg(long, num_args = 1..)]
    declared: Vec<PathBuf>,

    /// Discovery SBOMs (scanner output); only add unknown packages
    #[arg(long, num_args = 1..)]
    discovered: Vec<PathBuf>,

    /// VEX documents (OpenVEX, CycloneDX VEX, CSAF VEX) to apply to scan findings
    #[arg(long, num_args = 1..)]
    vex: Vec<PathBuf>,

    /// Output format
    #[arg(short, long)]
    output: Option<OutputFormat>,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,

    /// Extra version strings to treat as "unknown" when joining
    #[arg(long = "unknown-version", value_name = "VERSION")]
    unknown_versions: Vec<String>,

    /// Maximum SBOM file size in MB
    #[arg(long)]
    max_file_size: Option<u64>,
}

/// Arguments for the `scan` subcommand
#[derive(Parser)]
struct ScanArgs {
    #[command(flatten)]
    inventory: InventoryArgs,

    /// Maximum concurrent OSV requests
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// OSV request timeout in seconds
    #[arg(long)]
    api_timeout: Option<u64>,
}

impl InventoryArgs {
    fn split(self) -> (InventoryInputs, CliOverrides) {
        let inputs = InventoryInputs {
            declared: self.declared,
            discovered: self.discovered,
            vex: self.vex,
        };
        let overrides = CliOverrides {
            output_format: self.output,
            output_file: self.output_file,
            extra_unknown_versions: self.unknown_versions,
            max_file_size_mb: self.max_file_size,
            ..CliOverrides::default()
        };
        (inputs, overrides)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Load, resolve and join SBOMs into one inventory
    Inventory(InventoryArgs),

    /// Join SBOMs and scan the inventory for known vulnerabilities (OSV)
    Scan(ScanArgs),

    /// Show how an SBOM file would be detected and decoded
    Detect {
        /// Path to the SBOM file
        file: PathBuf,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn load_config(explicit: Option<&std::path::Path>, overrides: &CliOverrides) -> AppConfig {
    let (config, loaded_from) = AppConfig::from_file_with_overrides(explicit, overrides);
    if let Some(path) = loaded_from {
        tracing::debug!("Loaded config from {}", path.display());
    }
    config
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    match cli.command {
        Commands::Inventory(args) => {
            let (inputs, overrides) = args.split();
            let config = load_config(cli.config.as_deref(), &overrides);
            cli::run_inventory(&inputs, &config)
        }

        Commands::Scan(args) => {
            let (inputs, mut overrides) = args.inventory.split();
            overrides.scan_enabled = Some(true);
            overrides.max_concurrent = args.max_concurrent;
            overrides.timeout_secs = args.api_timeout;
            let config = load_config(cli.config.as_deref(), &overrides);
            cli::run_scan(&inputs, &config)
        }

        Commands::Detect { file } => {
            let report = cli::run_detect(&file)?;
            println!("{report}");
            Ok(())
        }

        Commands::ConfigSchema { output } => {
            let schema = sbom_join::config::generate_json_schema()
                .context("failed to generate JSON schema")?;
            if let Some(path) = output {
                std::fs::write(&path, &schema)
                    .with_context(|| format!("failed to write schema to {}", path.display()))?;
                eprintln!("Schema written to {}", path.display());
            } else {
                println!("{schema}");
            }
            Ok(())
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sbom-join", &mut io::stdout());
            Ok(())
        }
    }
}
