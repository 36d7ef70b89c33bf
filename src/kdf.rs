//! Key derivation from a password and salt using scrypt
//!
//! The work factors are fixed by the container format version so that
//! decryption reproduces the same key without storing per-file
//! parameters.

use scrypt::{Params, scrypt};
use zeroize::Zeroize;

use crate::error::{ErrorKind, Result, VaultError};

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of derived key in bytes
pub const KEY_LEN: usize = 32;

/// scrypt CPU/memory cost, log2 (N = 32768)
const SCRYPT_LOG_N: u8 = 15;

/// scrypt block size
const SCRYPT_R: u32 = 8;

/// scrypt parallelization
const SCRYPT_P: u32 = 1;

/// A derived symmetric key.
///
/// Produced fresh per call and never cached; zeroed on drop so key
/// material does not linger in memory.
pub struct DerivedKey {
    bytes: [u8; KEY_LEN],
}

impl DerivedKey {
    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 32-byte key from a password and salt.
///
/// Deterministic given identical inputs, and expensive by design to
/// resist brute-force guessing. An empty password is rejected with
/// `InvalidPassword` before derivation is attempted.
pub fn derive(password: &[u8], salt: &[u8; SALT_LEN]) -> Result<DerivedKey> {
    if password.is_empty() {
        return Err(VaultError::new(
            ErrorKind::InvalidPassword,
            "password must not be empty",
        ));
    }

    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        VaultError::new(
            ErrorKind::UnexpectedFailure,
            format!("failed to create scrypt params: {e}"),
        )
    })?;

    let mut key = [0u8; KEY_LEN];
    scrypt(password, salt, &params, &mut key).map_err(|e| {
        VaultError::new(
            ErrorKind::UnexpectedFailure,
            format!("scrypt key derivation failed: {e}"),
        )
    })?;

    Ok(DerivedKey { bytes: key })
}
