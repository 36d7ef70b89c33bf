//! Authenticated encryption with ChaCha20-Poly1305
//!
//! The tag is carried separately from the ciphertext so the container
//! can frame the two fields independently.

use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};

use crate::error::{ErrorKind, Result, VaultError};
use crate::kdf::DerivedKey;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 12;

/// Length of the Poly1305 authentication tag in bytes
pub const TAG_LEN: usize = 16;

/// Seal plaintext, returning ciphertext and tag separately.
///
/// The ciphertext has the same length as the plaintext. The caller
/// guarantees the nonce is unique per key: a reused (key, nonce) pair
/// silently breaks confidentiality and cannot be detected here.
pub fn seal(
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
    associated_data: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; TAG_LEN])> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut sealed = cipher
        .encrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad: associated_data,
            },
        )
        .map_err(|_| VaultError::new(ErrorKind::UnexpectedFailure, "cipher rejected plaintext"))?;

    let tag_start = sealed.len().checked_sub(TAG_LEN).ok_or_else(|| {
        VaultError::new(
            ErrorKind::UnexpectedFailure,
            "sealed output shorter than the authentication tag",
        )
    })?;
    let tag: [u8; TAG_LEN] = sealed[tag_start..].try_into().map_err(|_| {
        VaultError::new(
            ErrorKind::UnexpectedFailure,
            "failed to read authentication tag",
        )
    })?;
    sealed.truncate(tag_start);

    Ok((sealed, tag))
}

/// Open ciphertext, verifying the tag before any plaintext is released.
///
/// The tag covers the ciphertext and the associated data; nothing is
/// returned on a mismatch, including on early-exit paths. Fails with
/// `AuthenticationFailed`, which deliberately does not distinguish a
/// wrong password from tampered or corrupted data.
pub fn open(
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
    associated_data: &[u8],
    ciphertext: &[u8],
    tag: &[u8; TAG_LEN],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());

    let mut sealed = Vec::with_capacity(ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(ciphertext);
    sealed.extend_from_slice(tag);

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: &sealed,
                aad: associated_data,
            },
        )
        .map_err(|_| {
            VaultError::new(
                ErrorKind::AuthenticationFailed,
                "corrupt input, tampered-with data, or wrong password",
            )
        })
}
