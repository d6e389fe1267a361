//! Transfer protocols: atomic privileged upload and marker-delimited download.
//!
//! Uploads go through the transport as the unprivileged transport user, into
//! a temporary file. Only the final `mv` into place runs with the rights of
//! the exec channel, so the data channel never needs elevated credentials.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};

use crate::application::action::{Action, LineSink, SharedLineSink, Step};
use crate::application::services::files::{delete_file, mkdir_once, move_file};
use crate::domain::error::ValidationError;
use crate::domain::marker::MarkerScanner;
use crate::domain::shell;

// ── Upload ────────────────────────────────────────────────────────────────────

/// Upload `contents` to `dst` on the remote host.
///
/// When `dst` is not already a temporary path the bytes are uploaded to a
/// fresh temporary file and then moved over `dst`. The temporary file is
/// deleted afterwards whether or not the move succeeded.
#[must_use]
pub fn upload_bytes(contents: impl Into<Vec<u8>>, dst: &str) -> Action {
    if dst.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath {
            operation: "upload",
        });
    }
    let contents = contents.into();
    if contents.is_empty() {
        return Action::fail(ValidationError::EmptyContent {
            dest: dst.to_string(),
        });
    }
    let dst = dst.to_string();
    Action::deferred(move |state| {
        if state.temp_paths().is_temp(&dst) {
            return direct_upload(contents, &dst);
        }
        let tmp = match state.temp_paths().allocate() {
            Ok(tmp) => tmp,
            Err(err) => {
                return Action::fail(anyhow!(err).context("could not create temporary file"));
            }
        };
        Action::guarded(
            Action::Sequence(vec![
                Action::info(format!("Uploading to {dst:?}")),
                Action::debug(format!("Uploading to temporary file {tmp:?}")),
                direct_upload(contents, &tmp),
                Action::debug(format!("... and moving to final destination {dst}")),
                move_file(&tmp, &dst),
            ]),
            Action::best_effort(delete_file(&tmp)),
        )
    })
}

/// Upload straight to `dst`: ensure its directory, clear any old file, stream.
fn direct_upload(contents: Vec<u8>, dst: &str) -> Action {
    Action::Sequence(vec![
        mkdir_once(shell::parent_dir(dst)),
        Action::debug(format!("Making sure '{dst}' does not exist")),
        delete_file(dst),
        Step::Upload {
            dest: dst.to_string(),
            content: contents,
        }
        .into(),
    ])
}

/// Upload a local file to a remote path.
///
/// The local file is read only when the step runs, so it may be produced by
/// an earlier step of the same run.
#[must_use]
pub fn upload_file(local: impl Into<PathBuf>, remote: &str) -> Action {
    let local = local.into();
    if local.as_os_str().is_empty() {
        return Action::fail(ValidationError::EmptyLocalPath {
            operation: "upload",
        });
    }
    if remote.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath {
            operation: "upload",
        });
    }
    let remote = remote.to_string();
    Action::deferred(move |_| match std::fs::read(&local) {
        Ok(contents) => upload_bytes(contents, &remote),
        Err(err) => Action::fail(anyhow!(err).context(format!(
            "could not read local file {} for uploading to {remote:?}",
            local.display()
        ))),
    })
}

// ── Download ──────────────────────────────────────────────────────────────────

impl<W: Write + Send> LineSink for MarkerScanner<W> {
    fn line(&mut self, line: &[u8]) -> anyhow::Result<()> {
        self.feed(line).context("writing downloaded content")
    }
}

/// Dump a remote file between markers and write the block to `sink`.
///
/// The sink is flushed and dropped once the command finishes, on success or
/// failure. Output seen outside the markers (banners, prompts) is reported as
/// an informational message.
#[must_use]
pub fn download_to_writer<W: Write + Send + 'static>(remote: &str, sink: W) -> Action {
    if remote.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath {
            operation: "download",
        });
    }
    let scanner = Arc::new(Mutex::new(MarkerScanner::new(sink)));
    let lines: SharedLineSink = scanner.clone();

    Action::guarded(
        Action::Sequence(vec![
            Action::debug(format!("Dumping remote file {remote:?}")),
            Step::ExecLines {
                command: shell::dump_command(remote),
                sink: lines,
            }
            .into(),
        ]),
        Action::deferred(move |_| {
            let Ok(mut scanner) = scanner.lock() else {
                return Action::fail(anyhow!("download scanner poisoned"));
            };
            let extra = scanner.take_extra_output();
            let closed = scanner.close();
            let mut steps = Vec::new();
            if !extra.is_empty() {
                steps.push(Action::info(extra.join("\n")));
            }
            if let Err(err) = closed {
                steps.push(Action::fail(anyhow!(err).context("closing download sink")));
            }
            Action::Sequence(steps)
        }),
    )
}

/// Download a remote file into a local file, created when the step runs.
#[must_use]
pub fn download_file(remote: &str, local: impl Into<PathBuf>) -> Action {
    let local = local.into();
    if remote.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath {
            operation: "download",
        });
    }
    if local.as_os_str().is_empty() {
        return Action::fail(ValidationError::EmptyLocalPath {
            operation: "download",
        });
    }
    let remote = remote.to_string();
    Action::deferred(move |_| match File::create(&local) {
        Ok(file) => Action::Sequence(vec![
            Action::info(format!(
                "Downloading remote file {remote:?} -> {}",
                local.display()
            )),
            download_to_writer(&remote, BufWriter::new(file)),
        ]),
        Err(err) => Action::fail(anyhow!(err).context(format!("cannot create {}", local.display()))),
    })
}
