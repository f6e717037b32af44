//! Modmail Configuration Resolver
//!
//! Discovers a user-supplied config file, overlays `MM_`-prefixed
//! environment variables, merges onto built-in defaults, and validates the
//! result into a single immutable [`Config`] consumed at startup.
#![recursion_limit = "256"]

pub mod cli;
pub mod config;
pub mod error;

pub use config::{Config, Resolver};
pub use error::ConfigError;
