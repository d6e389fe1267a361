//! `SshCommunicator` argument construction and result handling.
//!
//! A recording `MockCommandRunner` stands in for the `ssh` binary.

use std::io::Cursor;
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use ferry_core::application::{CommandRunner, Communicator};
use ferry_core::domain::SshConfig;
use ferry_core::infra::ssh::SshCommunicator;

use crate::mocks::{err_output, ok_output};

// ── Mock: recording CommandRunner ────────────────────────────────────────────

type Call = (String, Vec<String>, Option<Vec<u8>>);

/// Records `(program, args, stdin)` for every call.
#[derive(Clone)]
struct MockCommandRunner {
    calls: Arc<Mutex<Vec<Call>>>,
    result: Arc<dyn Fn() -> Result<Output> + Send + Sync>,
}

impl MockCommandRunner {
    fn new_ok(stdout: &'static [u8]) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: Arc::new(move || Ok(ok_output(stdout))),
        }
    }

    fn new_exit(code: i32, stderr: &'static [u8]) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: Arc::new(move || Ok(err_output(code, stderr))),
        }
    }

    fn new_err(msg: &'static str) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            result: Arc::new(move || bail!("{msg}")),
        }
    }

    fn recorded_calls(&self) -> Vec<Call> {
        self.calls.lock().expect("mutex poisoned").clone()
    }

    fn record(&self, program: &str, args: &[&str], stdin: Option<&[u8]>) {
        self.calls.lock().expect("mutex poisoned").push((
            program.to_owned(),
            args.iter().map(ToString::to_string).collect(),
            stdin.map(<[u8]>::to_vec),
        ));
    }
}

impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.record(program, args, None);
        (self.result)()
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        self.run(program, args).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        self.record(program, args, Some(input));
        (self.result)()
    }
}

fn config() -> SshConfig {
    SshConfig {
        host: "web-1.internal".to_string(),
        ..SshConfig::default()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn test_new_requires_host() {
    let result = SshCommunicator::new(MockCommandRunner::new_ok(b""), SshConfig::default());
    assert!(result.is_err());
}

#[tokio::test]
async fn test_exec_wraps_command_in_sudo() {
    let runner = MockCommandRunner::new_ok(b"hello\n");
    let comm = SshCommunicator::new(runner.clone(), config()).expect("communicator");

    let output = comm.exec("[ -f '/etc/hosts' ]").await.expect("exec");
    assert_eq!(output.stdout, b"hello\n");

    let calls = runner.recorded_calls();
    assert_eq!(calls.len(), 1);
    let (program, args, stdin) = &calls[0];
    assert_eq!(program, "ssh");
    assert!(stdin.is_none());
    assert_eq!(
        args,
        &vec![
            "-o",
            "BatchMode=yes",
            "-o",
            "ConnectTimeout=10",
            "-o",
            "ServerAliveInterval=15",
            "-o",
            "ServerAliveCountMax=3",
            "root@web-1.internal",
            "sudo -n sh -c '[ -f '\\''/etc/hosts'\\'' ]'",
        ]
    );
}

#[tokio::test]
async fn test_exec_without_sudo_uses_port_and_identity() {
    let runner = MockCommandRunner::new_ok(b"");
    let comm = SshCommunicator::new(
        runner.clone(),
        SshConfig {
            user: "deploy".to_string(),
            port: 2222,
            identity_file: Some("/home/deploy/.ssh/id_ed25519".to_string()),
            sudo: false,
            ..config()
        },
    )
    .expect("communicator");

    comm.exec("uptime").await.expect("exec");

    let (_, args, _) = &runner.recorded_calls()[0];
    assert_eq!(&args[..4], &["-i", "/home/deploy/.ssh/id_ed25519", "-p", "2222"]);
    assert_eq!(args[args.len() - 2], "deploy@web-1.internal");
    assert_eq!(args[args.len() - 1], "uptime");
}

#[tokio::test]
async fn test_exec_returns_non_zero_status_as_output() {
    let runner = MockCommandRunner::new_exit(1, b"");
    let comm = SshCommunicator::new(runner, config()).expect("communicator");

    let output = comm.exec("[ -f '/nope' ]").await.expect("exec");
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_exec_spawn_failure_is_an_error() {
    let runner = MockCommandRunner::new_err("failed to spawn ssh");
    let comm = SshCommunicator::new(runner, config()).expect("communicator");

    let err = comm.exec("true").await.expect_err("spawn failure");
    assert!(format!("{err:#}").contains("failed to spawn ssh"));
}

#[tokio::test]
async fn test_upload_streams_content_over_stdin_without_sudo() {
    let runner = MockCommandRunner::new_ok(b"");
    let comm = SshCommunicator::new(runner.clone(), config()).expect("communicator");

    let mut content = Cursor::new(b"key = value\n".to_vec());
    comm.upload("/tmp/tmpfile-0a1b2c.tmp", &mut content)
        .await
        .expect("upload");

    let (program, args, stdin) = &runner.recorded_calls()[0];
    assert_eq!(program, "ssh");
    assert_eq!(args.last().map(String::as_str), Some("cat > '/tmp/tmpfile-0a1b2c.tmp'"));
    assert_eq!(stdin.as_deref(), Some(&b"key = value\n"[..]));
}

#[tokio::test]
async fn test_upload_non_zero_exit_is_an_error() {
    let runner = MockCommandRunner::new_exit(1, b"sh: /root/x: Permission denied\n");
    let comm = SshCommunicator::new(runner, config()).expect("communicator");

    let mut content = Cursor::new(b"x".to_vec());
    let err = comm
        .upload("/root/x", &mut content)
        .await
        .expect_err("upload fails");
    assert!(err.to_string().contains("Permission denied"), "got {err:#}");
}
