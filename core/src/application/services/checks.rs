//! Remote and local existence checks.

use std::path::PathBuf;

use crate::application::action::Checker;
use crate::domain::cache::{DIR_EXISTS_PREFIX, FILE_EXISTS_PREFIX, cache_key};
use crate::domain::shell;

/// `[ -f path ]` on the remote host. Absence is `false`, not an error.
#[must_use]
pub fn check_file_exists(path: &str) -> Checker {
    Checker::exec(shell::file_exists_command(path))
}

/// Like [`check_file_exists`], but asks the remote host at most once per run.
///
/// Deleting the file through [`delete_file`](super::files::delete_file)
/// evicts the cached answer.
#[must_use]
pub fn check_file_exists_once(path: &str) -> Checker {
    Checker::once(
        cache_key(FILE_EXISTS_PREFIX, path),
        check_file_exists(path),
    )
}

#[must_use]
pub fn check_file_absent(path: &str) -> Checker {
    !check_file_exists(path)
}

/// `[ -d path ]` on the remote host, cached per run.
#[must_use]
pub fn check_dir_exists_once(path: &str) -> Checker {
    Checker::once(
        cache_key(DIR_EXISTS_PREFIX, path),
        Checker::exec(shell::dir_exists_command(path)),
    )
}

/// Local stat. An empty path, a missing file and a stat failure
/// (e.g. permission denied) are all reported as `false`.
#[must_use]
pub fn check_local_file_exists(path: impl Into<PathBuf>) -> Checker {
    Checker::LocalFile(path.into())
}
