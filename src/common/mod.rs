//! Common utilities shared across the harness

pub mod config;
pub mod error;
pub mod logging;
pub mod naming;
pub mod paths;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
