//! Unit tests for ferry-core
//!
//! These tests run against an in-memory fake host and run fast without
//! network access.

mod leftovers;
mod ssh_transport;
