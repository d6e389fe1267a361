//! Temporary remote path allocation.
//!
//! Paths have the shape `<root>/<prefix>-<6 lowercase hex>.<ext>`, where the
//! hex suffix comes from 3 bytes of OS randomness. Recognition is a plain
//! prefix/suffix test on the base name: any file that happens to share the
//! prefix and extension is treated as temporary too. That is an accepted
//! approximation, not a proof of ownership.

use std::path::Path;

use rand::RngCore;
use rand::rngs::OsRng;

use crate::domain::config::TempConfig;
use crate::domain::error::TempPathError;

/// Number of random bytes in the suffix (6 hex chars).
const RANDOM_BYTES: usize = 3;

/// Allocates and recognizes temporary remote file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempPathAllocator {
    root: String,
    prefix: String,
    extension: String,
}

impl Default for TempPathAllocator {
    fn default() -> Self {
        Self::from_config(&TempConfig::default())
    }
}

impl TempPathAllocator {
    #[must_use]
    pub fn from_config(config: &TempConfig) -> Self {
        Self {
            root: config.root.clone(),
            prefix: config.prefix.clone(),
            extension: config.extension.clone(),
        }
    }

    /// Returns a fresh temporary file name. The file is not created.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix or extension is empty, or if the OS
    /// random source fails.
    pub fn allocate(&self) -> Result<String, TempPathError> {
        if self.prefix.is_empty() || self.extension.is_empty() {
            return Err(TempPathError::EmptyPrefixOrExtension);
        }
        let mut bytes = [0u8; RANDOM_BYTES];
        OsRng.try_fill_bytes(&mut bytes)?;
        Ok(format!(
            "{}/{}-{}.{}",
            self.root.trim_end_matches('/'),
            self.prefix,
            hex_encode(&bytes),
            self.extension
        ))
    }

    /// Returns `true` if the base name of `path` looks like one of ours.
    #[must_use]
    pub fn is_temp(&self, path: &str) -> bool {
        let Some(base) = Path::new(path).file_name().and_then(|b| b.to_str()) else {
            return false;
        };
        base.starts_with(&self.prefix) && base.ends_with(&self.extension)
    }
}

/// Allocate a temporary file name with the default root, prefix and extension.
///
/// # Errors
///
/// See [`TempPathAllocator::allocate`].
pub fn temp_filename() -> Result<String, TempPathError> {
    TempPathAllocator::default().allocate()
}

/// Check a path against the default prefix and extension.
#[must_use]
pub fn is_temp_filename(path: &str) -> bool {
    TempPathAllocator::default().is_temp(path)
}

/// Lowercase hex encoding.
#[must_use]
pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
