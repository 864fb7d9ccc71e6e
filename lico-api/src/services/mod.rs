//! Derived computations and background work
//!
//! - `wellness`: snapshot aggregation and proactive insight generation
//! - `automation`: routine matching and execution
//! - `schedule`: cron expressions for scheduled routines
//! - `habit_stats`, `finance_summary`: read-side reductions for handlers
//! - `system_health`: latency probes for the health cron

pub mod automation;
pub mod finance_summary;
pub mod habit_stats;
pub mod schedule;
pub mod system_health;
pub mod wellness;

pub use automation::AutomationEngine;
