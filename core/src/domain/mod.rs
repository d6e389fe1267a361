//! Domain layer: pure types, validation and protocol state machines.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod cache;
pub mod config;
pub mod error;
pub mod marker;
pub mod shell;
pub mod temp_path;

pub use cache::{CheckCache, DIR_EXISTS_PREFIX, FILE_EXISTS_PREFIX, cache_key};
pub use config::{ProvisionConfig, SshConfig, TempConfig};
pub use error::{ActionError, CleanupError, TempPathError, ValidationError};
pub use marker::{MARK_END, MARK_START, MarkerScanner};
pub use temp_path::TempPathAllocator;
