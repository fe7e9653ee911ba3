//! Changelog Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities for the changelog workspace.
//!
//! - **Error Handling**: error type for environment and settings parsing
//! - **Environment**: `.env` aware variable readers
//! - **Logging**: tracing subscriber bootstrap
//!
//! # Example
//!
//! ```no_run
//! use changelog_common::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env().unwrap_or_default();
//! init_logging(&config).ok();
//! ```

pub mod env;
pub mod error;
pub mod logging;

pub use error::{CommonError, Result};
