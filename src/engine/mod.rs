//! Execution engine for deploydag
//!
//! The engine orchestrates:
//! 1. Planning - Narrow and orient the unit graph for a command
//! 2. Executing - Walk it, running unit commands with bounded parallelism

pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, execute};
pub use planner::{Action, plan, tiers};
