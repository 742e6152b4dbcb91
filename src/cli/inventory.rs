//! Inventory and scan command handlers.
//!
//! Implements the `inventory` and `scan` subcommands: load the declared and
//! discovered documents, join them, optionally scan, and write the result.

use crate::config::{AppConfig, Validatable};
use crate::pipeline::{
    build_inventory, build_scanner, render_inventory, scan_inventory, write_output,
    InventoryInputs, OutputTarget,
};
use anyhow::{bail, Context, Result};

fn check_config(config: &AppConfig) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
    bail!("Invalid configuration:\n  {}", messages.join("\n  "));
}

/// Run the inventory command.
pub fn run_inventory(inputs: &InventoryInputs, config: &AppConfig) -> Result<()> {
    check_config(config)?;

    let inventory = build_inventory(inputs, config).context("Failed to build inventory")?;
    let output = render_inventory(&inventory, None, config.output.format)?;
    write_output(&output, &OutputTarget::from_option(config.output.file.clone()))
}

/// Run the scan command.
///
/// Scanning is switched on regardless of `scan.enabled` in the config file.
pub fn run_scan(inputs: &InventoryInputs, config: &AppConfig) -> Result<()> {
    let mut config = config.clone();
    config.scan.enabled = true;
    check_config(&config)?;

    let inventory = build_inventory(inputs, &config).context("Failed to build inventory")?;
    let scanner = build_scanner(&config.scan)?;
    let mut results = scan_inventory(&inventory.sbom, scanner.as_ref())?;
    let statements: Vec<_> = inventory.vex_statements().cloned().collect();
    if !statements.is_empty() {
        let annotated = results.apply_vex(&statements);
        tracing::info!(
            "Applied {} VEX statements: {} findings annotated, {} suppressed",
            statements.len(),
            annotated,
            results.suppressed_count()
        );
    }

    let output = render_inventory(&inventory, Some(&results), config.output.format)?;
    write_output(&output, &OutputTarget::from_option(config.output.file.clone()))
}
