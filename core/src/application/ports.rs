//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `std` and `crate::domain`, never from
//! `crate::infra`.

use std::io::Read;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::config::ProvisionConfig;

// ── Transport Port ────────────────────────────────────────────────────────────

/// Command-execution channel to the managed host.
///
/// Both operations are synchronous from the caller's point of view: the
/// returned future completes when the transfer or command has finished.
#[allow(async_fn_in_trait)]
pub trait Communicator {
    /// Stream `content` into `dest` on the remote host, as the transport user.
    async fn upload(&self, dest: &str, content: &mut (dyn Read + Send)) -> Result<()>;
    /// Run a shell command on the remote host and capture its output.
    ///
    /// A non-zero exit status is reported through `Output::status`, not as an
    /// `Err`; `Err` means the transport itself failed.
    async fn exec(&self, command: &str) -> Result<Output>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so transports can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `input`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts user-visible messages so actions can report progress without
/// depending on a presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an informational message.
    fn step(&self, message: &str);
    /// Emit a debug-level detail.
    fn detail(&self, message: &str);
    /// Emit a warning, e.g. a swallowed best-effort failure.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Abstracts loading and saving of `ProvisionConfig`.
pub trait ConfigStore {
    /// Load the configuration, falling back to defaults when none is stored.
    fn load(&self) -> Result<ProvisionConfig>;
    /// Persist the configuration.
    fn save(&self, config: &ProvisionConfig) -> Result<()>;
    /// Location of the stored configuration.
    fn path(&self) -> Result<PathBuf>;
}
