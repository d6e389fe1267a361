//! Ferry core library: action composition, transfer protocols and checks
//! for provisioning a host over a plain shell channel.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod domain;
pub mod infra;
