//! Leaf file operations, remote and local.

use std::io::ErrorKind;
use std::path::PathBuf;

use crate::application::action::{Action, Step};
use crate::application::services::checks::check_dir_exists_once;
use crate::domain::cache::{DIR_EXISTS_PREFIX, FILE_EXISTS_PREFIX, cache_key};
use crate::domain::error::ValidationError;
use crate::domain::shell;

/// Paths longer than this are never stat'ed.
pub const MAX_PATH_LENGTH: usize = 4096;

/// Remove a remote file (`rm -f`) and evict its existence-check cache entry.
#[must_use]
pub fn delete_file(path: &str) -> Action {
    if path.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath {
            operation: "delete",
        });
    }
    Action::Sequence(vec![
        Action::exec(shell::remove_command(path)),
        Step::CacheEvict(cache_key(FILE_EXISTS_PREFIX, path)).into(),
    ])
}

/// Remove a local file. A file that is already gone is not an error.
#[must_use]
pub fn delete_local_file(path: impl Into<PathBuf>) -> Action {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return Action::fail(ValidationError::EmptyLocalPath {
            operation: "delete",
        });
    }
    Step::RemoveLocal(path).into()
}

/// Move a remote file over `dst`, creating the destination directory first.
///
/// This is the step a privileged transport runs with elevated rights.
#[must_use]
pub fn move_file(src: &str, dst: &str) -> Action {
    if src.is_empty() || dst.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath { operation: "move" });
    }
    Action::exec(shell::move_command(src, dst))
}

/// Move a local file over `dst`, creating the destination directory first.
#[must_use]
pub fn move_local_file(src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Action {
    let (src, dst) = (src.into(), dst.into());
    if src.as_os_str().is_empty() || dst.as_os_str().is_empty() {
        return Action::fail(ValidationError::EmptyLocalPath { operation: "move" });
    }
    Step::MoveLocal { src, dst }.into()
}

/// Create (or truncate) a local file and write `contents` to it.
///
/// Not atomic: a crash mid-write leaves a partial file.
#[must_use]
pub fn write_local_file(path: impl Into<PathBuf>, contents: impl Into<String>) -> Action {
    let path = path.into();
    if path.as_os_str().is_empty() {
        return Action::fail(ValidationError::EmptyLocalPath {
            operation: "write",
        });
    }
    Step::WriteLocal {
        path,
        contents: contents.into(),
    }
    .into()
}

/// `mkdir -p dir`, skipped when the directory is already known to exist.
#[must_use]
pub fn mkdir_once(dir: &str) -> Action {
    if dir.is_empty() {
        return Action::fail(ValidationError::EmptyRemotePath { operation: "mkdir" });
    }
    Action::when(
        !check_dir_exists_once(dir),
        Action::Sequence(vec![
            Action::exec(shell::mkdir_command(dir)),
            Step::CacheStore {
                key: cache_key(DIR_EXISTS_PREFIX, dir),
                value: true,
            }
            .into(),
        ]),
    )
}

/// Reports whether a local file or directory exists.
///
/// Paths longer than [`MAX_PATH_LENGTH`] are rejected without touching the
/// filesystem. Only a not-found stat error counts as absent; other stat
/// errors (e.g. permission denied) report `true`.
#[must_use]
pub fn local_file_exists(name: &str) -> bool {
    if name.len() > MAX_PATH_LENGTH {
        return false;
    }
    match std::fs::metadata(name) {
        Ok(_) => true,
        Err(err) => err.kind() != ErrorKind::NotFound,
    }
}
