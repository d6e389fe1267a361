//! `Communicator` over the system `ssh` binary.
//!
//! Commands go through a `CommandRunner` so tests can inject a recording
//! runner. Exec commands are wrapped in `sudo -n sh -c` when configured;
//! uploads (`cat > dest` fed from stdin) always run as the login user.

use std::io::Read;
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result, bail, ensure};

use crate::application::ports::{CommandRunner, Communicator};
use crate::domain::config::{DEFAULT_SSH_PORT, SshConfig};
use crate::domain::shell::quote_path;
use crate::infra::command_runner::TokioCommandRunner;

pub struct SshCommunicator<R: CommandRunner> {
    runner: R,
    config: SshConfig,
}

impl<R: CommandRunner> SshCommunicator<R> {
    /// Create a communicator with an explicit runner.
    ///
    /// # Errors
    ///
    /// Returns an error if no host is configured.
    pub fn new(runner: R, config: SshConfig) -> Result<Self> {
        ensure!(!config.host.is_empty(), "ssh host is not configured");
        Ok(Self { runner, config })
    }

    #[must_use]
    pub fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Arguments for `ssh`, ending with the remote command.
    #[must_use]
    pub fn ssh_args(&self, remote_command: &str) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(identity_file) = &self.config.identity_file {
            args.push("-i".to_string());
            args.push(identity_file.clone());
        }

        if self.config.port != DEFAULT_SSH_PORT {
            args.push("-p".to_string());
            args.push(self.config.port.to_string());
        }

        // Fail instead of prompting, and give up on stalled connections.
        for opt in [
            "BatchMode=yes",
            "ConnectTimeout=10",
            "ServerAliveInterval=15",
            "ServerAliveCountMax=3",
        ] {
            args.push("-o".to_string());
            args.push(opt.to_string());
        }

        args.push(format!("{}@{}", self.config.user, self.config.host));
        args.push(remote_command.to_string());
        args
    }

    /// The command as it is sent for execution, with `sudo` if enabled.
    #[must_use]
    pub fn privileged(&self, command: &str) -> String {
        if self.config.sudo {
            format!("sudo -n sh -c {}", quote_path(command))
        } else {
            command.to_string()
        }
    }
}

impl SshCommunicator<TokioCommandRunner> {
    /// Convenience constructor for production use.
    ///
    /// # Errors
    ///
    /// Returns an error if no host is configured.
    pub fn from_config(config: &SshConfig) -> Result<Self> {
        let runner = TokioCommandRunner::new(Duration::from_secs(config.command_timeout_secs));
        Self::new(runner, config.clone())
    }
}

impl<R: CommandRunner> Communicator for SshCommunicator<R> {
    async fn upload(&self, dest: &str, content: &mut (dyn Read + Send)) -> Result<()> {
        let mut buf = Vec::new();
        content
            .read_to_end(&mut buf)
            .with_context(|| format!("reading content for {dest}"))?;

        let args = self.ssh_args(&format!("cat > {}", quote_path(dest)));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self
            .runner
            .run_with_stdin("ssh", &args, &buf)
            .await
            .context("ssh upload")?;
        if !output.status.success() {
            bail!(
                "ssh upload to {dest} exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }

    async fn exec(&self, command: &str) -> Result<Output> {
        let args = self.ssh_args(&self.privileged(command));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.runner.run("ssh", &args).await.context("ssh exec")
    }
}
