//! Application layer: ports, the action algebra, its evaluation engine and
//! the transfer/check services built on top.
//!
//! This module depends only on `crate::domain`, never on `crate::infra`.

pub mod action;
pub mod engine;
pub mod ports;
pub mod services;

pub use action::{Action, Checker, MessageLevel, Step};
pub use engine::{CancelSignal, Engine, RunState};
pub use ports::{CommandRunner, Communicator, ConfigStore, ProgressReporter};
