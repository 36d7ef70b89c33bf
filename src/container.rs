//! Self-describing binary envelope for encrypted payloads
//!
//! Container layout (offsets in bytes, integers big-endian):
//!
//! | offset | length | field                        |
//! |--------|--------|------------------------------|
//! | 0      | 4      | magic `"VBOX"`               |
//! | 4      | 1      | format version (currently 1) |
//! | 5      | 16     | salt                         |
//! | 21     | 12     | nonce                        |
//! | 33     | 8      | ciphertext length (u64)      |
//! | 41     | n      | ciphertext                   |
//! | 41 + n | 16     | authentication tag           |
//!
//! Version 1 fixes the key derivation work factors (see [`crate::kdf`])
//! and the cipher (ChaCha20-Poly1305), so no further parameters are
//! stored in the envelope.

use crate::cipher::{NONCE_LEN, TAG_LEN};
use crate::error::{ErrorKind, Result, VaultError};
use crate::kdf::SALT_LEN;

/// Magic bytes identifying the container format
pub const MAGIC: [u8; 4] = *b"VBOX";

/// Current format version
pub const FORMAT_VERSION: u8 = 1;

/// Fixed header size: magic + version + salt + nonce + length prefix
pub const HEADER_LEN: usize = 4 + 1 + SALT_LEN + NONCE_LEN + 8;

/// Smallest well-formed container: empty ciphertext plus the tag
pub const MIN_LEN: usize = HEADER_LEN + TAG_LEN;

/// A parsed encryption envelope.
///
/// Constructed once per encryption and fully consumed by one
/// decryption; nothing retains a container across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Header bytes covered by the authentication tag: magic, version and
/// salt. Tampering with any of them invalidates the tag.
pub fn associated_data(salt: &[u8; SALT_LEN]) -> [u8; 4 + 1 + SALT_LEN] {
    let mut aad = [0u8; 4 + 1 + SALT_LEN];
    aad[..4].copy_from_slice(&MAGIC);
    aad[4] = FORMAT_VERSION;
    aad[5..].copy_from_slice(salt);
    aad
}

impl Container {
    /// Encode into the binary layout documented at module level.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len() + TAG_LEN);
        out.extend_from_slice(&MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&(self.ciphertext.len() as u64).to_be_bytes());
        out.extend_from_slice(&self.ciphertext);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Decode a container, validating magic and version before reading
    /// any further fields.
    ///
    /// Truncated input, an unsupported version, an oversized length
    /// declaration and trailing bytes after the tag all fail with
    /// `MalformedContainer`; no input can cause an out-of-bounds read.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut pos = 0;

        if bytes.len() < pos + MAGIC.len() {
            return Err(malformed("input likely truncated while reading magic"));
        }
        if bytes[pos..pos + MAGIC.len()] != MAGIC {
            return Err(malformed("input unrecognized as an encrypted container"));
        }
        pos += MAGIC.len();

        if bytes.len() < pos + 1 {
            return Err(malformed("input likely truncated while reading version"));
        }
        let version = bytes[pos];
        if version != FORMAT_VERSION {
            return Err(malformed(format!(
                "container version {version} is not supported by this build"
            )));
        }
        pos += 1;

        if bytes.len() < pos + SALT_LEN {
            return Err(malformed("input likely truncated while reading salt"));
        }
        let salt: [u8; SALT_LEN] = bytes[pos..pos + SALT_LEN]
            .try_into()
            .map_err(|_| malformed("failed to read salt"))?;
        pos += SALT_LEN;

        if bytes.len() < pos + NONCE_LEN {
            return Err(malformed("input likely truncated while reading nonce"));
        }
        let nonce: [u8; NONCE_LEN] = bytes[pos..pos + NONCE_LEN]
            .try_into()
            .map_err(|_| malformed("failed to read nonce"))?;
        pos += NONCE_LEN;

        if bytes.len() < pos + 8 {
            return Err(malformed(
                "input likely truncated while reading ciphertext length",
            ));
        }
        let length_bytes: [u8; 8] = bytes[pos..pos + 8]
            .try_into()
            .map_err(|_| malformed("failed to read ciphertext length"))?;
        let declared_len = u64::from_be_bytes(length_bytes);
        pos += 8;

        // *Valid* input can fail this check if the platform's isize is
        // small.
        if declared_len > isize::MAX as u64 {
            return Err(malformed(
                "ciphertext length exceeds this system's max isize",
            ));
        }
        let declared_len = declared_len as usize;

        if bytes.len() - pos < declared_len {
            return Err(malformed(
                "truncated or corrupt input; claimed length greater than available input",
            ));
        }
        let ciphertext = bytes[pos..pos + declared_len].to_vec();
        pos += declared_len;

        if bytes.len() < pos + TAG_LEN {
            return Err(malformed("input likely truncated while reading tag"));
        }
        let tag: [u8; TAG_LEN] = bytes[pos..pos + TAG_LEN]
            .try_into()
            .map_err(|_| malformed("failed to read tag"))?;
        pos += TAG_LEN;

        if pos < bytes.len() {
            return Err(malformed("invalid input: unexpected data after tag"));
        }

        Ok(Self {
            salt,
            nonce,
            ciphertext,
            tag,
        })
    }
}

fn malformed(msg: impl Into<String>) -> VaultError {
    VaultError::new(ErrorKind::MalformedContainer, msg)
}
