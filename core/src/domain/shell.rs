//! Remote shell command construction.
//!
//! Every path is single-quoted so spaces and metacharacters survive the
//! remote shell.

use crate::domain::marker::{MARK_END, MARK_START};

/// Quote a path for a POSIX shell.
#[must_use]
pub fn quote_path(path: &str) -> String {
    format!("'{}'", path.replace('\'', "'\\''"))
}

/// Wrap a command in double quotes, escaping what the outer shell expands.
fn double_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[must_use]
pub fn file_exists_command(path: &str) -> String {
    format!("[ -f {} ]", quote_path(path))
}

#[must_use]
pub fn dir_exists_command(path: &str) -> String {
    format!("[ -d {} ]", quote_path(path))
}

#[must_use]
pub fn mkdir_command(dir: &str) -> String {
    format!("mkdir -p {}", quote_path(dir))
}

#[must_use]
pub fn remove_command(path: &str) -> String {
    format!("rm -f {}", quote_path(path))
}

/// Create the destination directory and move `src` over `dst` in one command.
#[must_use]
pub fn move_command(src: &str, dst: &str) -> String {
    format!(
        "mkdir -p {} && mv -f {} {}",
        quote_path(parent_dir(dst)),
        quote_path(src),
        quote_path(dst)
    )
}

/// Dump a remote file between the START/END markers.
#[must_use]
pub fn dump_command(path: &str) -> String {
    let inner = format!(
        "echo '{MARK_START}' && cat {} && echo '{MARK_END}'",
        quote_path(path)
    );
    format!("sh -c {}", double_quote(&inner))
}

/// Parent directory of a remote path, `.` for bare names and `/` for the root.
#[must_use]
pub fn parent_dir(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(i) => &trimmed[..i],
        None if path.starts_with('/') => "/",
        None => ".",
    }
}
