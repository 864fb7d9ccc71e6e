//! # Life Companion Common Library
//!
//! Shared code for the life companion service:
//! - Configuration loading and root folder resolution
//! - Database schema initialization
//! - Automation event types (AutomationEvent) and the EventBus
//! - Credential and session token hashing
//! - Time window helpers

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
