//! Application services: action builders for each use-case.
//!
//! Every builder is pure: it returns an `Action` tree and performs no I/O.
//! Services import only from `crate::domain` and `crate::application`,
//! never from `crate::infra`.

pub mod checks;
pub mod files;
pub mod leftovers;
pub mod transfer;

pub use checks::{
    check_dir_exists_once, check_file_absent, check_file_exists, check_file_exists_once,
    check_local_file_exists,
};
pub use files::{
    MAX_PATH_LENGTH, delete_file, delete_local_file, local_file_exists, mkdir_once, move_file,
    move_local_file, write_local_file,
};
pub use leftovers::{add_leftover, cleanup_leftovers};
pub use transfer::{download_file, download_to_writer, upload_bytes, upload_file};
