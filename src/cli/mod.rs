//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand.

mod detect;
mod inventory;

pub use detect::run_detect;
pub use inventory::{run_inventory, run_scan};

pub use crate::pipeline::InventoryInputs;
