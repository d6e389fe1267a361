//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains the I/O-performing adapters: local process
//! execution, the SSH transport, configuration loading and logging.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.

pub mod command_runner;
pub mod config;
pub mod reporter;
pub mod ssh;
