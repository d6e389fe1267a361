//! Domain types for Ferry configuration.
//!
//! Pure data only. Loading lives in `crate::infra::config`.

use serde::{Deserialize, Serialize};

// ── Defaults ─────────────────────────────────────────────────────────────────

pub const DEFAULT_REMOTE_TMP: &str = "/tmp";
pub const DEFAULT_TEMP_PREFIX: &str = "tmpfile";
pub const DEFAULT_TEMP_EXTENSION: &str = "tmp";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30;

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration stored in `~/.ferry/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Temporary file naming on the remote host.
    pub temp: TempConfig,
    /// Transport settings for the SSH communicator.
    pub ssh: SshConfig,
}

/// Naming of intermediate files on the remote host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TempConfig {
    /// Directory that holds temporary files, e.g. `/tmp`.
    pub root: String,
    /// Base name prefix, e.g. `tmpfile`.
    pub prefix: String,
    /// File extension without the dot, e.g. `tmp`.
    pub extension: String,
}

impl Default for TempConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_REMOTE_TMP.to_string(),
            prefix: DEFAULT_TEMP_PREFIX.to_string(),
            extension: DEFAULT_TEMP_EXTENSION.to_string(),
        }
    }
}

/// Connection settings for `SshCommunicator`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SshConfig {
    pub host: String,
    pub user: String,
    pub port: u16,
    /// Private key passed with `-i`.
    pub identity_file: Option<String>,
    /// Per-command timeout in seconds.
    pub command_timeout_secs: u64,
    /// Wrap exec commands in `sudo sh -c`. Uploads never use sudo.
    pub sudo: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: "root".to_string(),
            port: DEFAULT_SSH_PORT,
            identity_file: None,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT_SECS,
            sudo: true,
        }
    }
}
