//! File encryption/decryption operations for native hosts
//!
//! Thin adapter over [`crate::engine`] for hosts that work with paths
//! instead of in-memory buffers. Output files are created with mode
//! 0o600 (read/write for owner only) on Unix systems.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::engine;
use crate::error::{ErrorKind, Result, VaultError};
use crate::job::{self, Mode};

/// Encrypt a file with a password.
///
/// Reads plaintext from `input_path` and writes the encrypted container
/// to `output_path`.
pub fn encrypt_file(input_path: &Path, output_path: &Path, password: &str) -> Result<()> {
    let plaintext = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let container = engine::encrypt(password.as_bytes(), &plaintext)
        .map_err(|e| e.with_context("encryption failed"))?;
    write_file_secure(output_path, &container)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(())
}

/// Decrypt a file with a password.
///
/// Reads an encrypted container from `input_path` and writes the
/// plaintext to `output_path`.
pub fn decrypt_file(input_path: &Path, output_path: &Path, password: &str) -> Result<()> {
    let bytes = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    let plaintext = engine::decrypt(password.as_bytes(), &bytes)
        .map_err(|e| e.with_context("failed to decrypt"))?;
    write_file_secure(output_path, &plaintext)
        .map_err(|e| e.with_context(format!("failed to write to {}", output_path.display())))?;
    Ok(())
}

/// Sibling path with the filename transform applied
/// (see [`job::output_name`]).
pub fn default_output_path(input_path: &Path, mode: Mode) -> PathBuf {
    let name = input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input_path.with_file_name(job::output_name(&name, mode))
}

/// Write file with secure permissions (0o600 on Unix)
fn write_file_secure(path: &Path, contents: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::fs::OpenOptions;
        use std::os::unix::fs::OpenOptionsExt;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .map_err(|e| {
                VaultError::with_source(
                    ErrorKind::UnexpectedFailure,
                    format!("failed to open {}", path.display()),
                    e,
                )
            })?;

        file.write_all(contents).map_err(|e| {
            VaultError::with_source(
                ErrorKind::UnexpectedFailure,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        fs::write(path, contents).map_err(|e| {
            VaultError::with_source(
                ErrorKind::UnexpectedFailure,
                format!("failed to write {}", path.display()),
                e,
            )
        })?;
        Ok(())
    }
}

fn read_error(path: &Path, err: io::Error) -> VaultError {
    VaultError::with_source(
        ErrorKind::UnexpectedFailure,
        format!("failed to read from {}", path.display()),
        err,
    )
}
