//! High-level encryption/decryption pipeline
//!
//! Ties the units together: derive a key from the password, seal or
//! open with the container header as associated data, and frame the
//! result. Each call is a self-contained computation over byte
//! buffers; nothing is shared between calls, so independent jobs may
//! run on any workers without coordination.

use rand::RngCore;
use rand::rngs::OsRng;
use tracing::debug;

use crate::cipher::{self, NONCE_LEN};
use crate::container::{self, Container};
use crate::error::Result;
use crate::kdf::{self, SALT_LEN};

/// Observer for coarse progress reporting.
///
/// Implemented by any `FnMut(u8)`. Values are percentages and are
/// monotonically non-decreasing within one operation; a successful
/// operation reports 100 exactly once, as its final call. Failed
/// operations stop reporting wherever they were.
pub trait Progress {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> Progress for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

// Stage weights. Key derivation dominates both directions.
const AFTER_DECODE: u8 = 10;
const AFTER_DERIVE: u8 = 80;
const AFTER_CIPHER: u8 = 95;

/// Encrypt plaintext with a password using a fresh random salt and
/// nonce drawn from the OS CSPRNG.
pub fn encrypt(password: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_progress(password, plaintext, &mut |_percent: u8| {})
}

/// Encrypt plaintext, reporting progress to the given observer.
pub fn encrypt_with_progress(
    password: &[u8],
    plaintext: &[u8],
    progress: &mut dyn Progress,
) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    seal_into_container(password, plaintext, &salt, &nonce, progress)
}

/// Encrypt plaintext using a provided salt and nonce.
///
/// This function is ONLY for testing purposes to generate deterministic
/// output. NEVER use this in production - always use [`encrypt`], which
/// generates a random salt and nonce per call.
pub fn encrypt_deterministic(
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    seal_into_container(password, plaintext, salt, nonce, &mut |_percent: u8| {})
}

fn seal_into_container(
    password: &[u8],
    plaintext: &[u8],
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    progress: &mut dyn Progress,
) -> Result<Vec<u8>> {
    progress.report(0);

    let key = kdf::derive(password, salt)?;
    progress.report(AFTER_DERIVE);

    let aad = container::associated_data(salt);
    let (ciphertext, tag) = cipher::seal(&key, nonce, &aad, plaintext)?;
    progress.report(AFTER_CIPHER);

    debug!(plaintext_len = plaintext.len(), "sealed buffer into container");
    let encoded = Container {
        salt: *salt,
        nonce: *nonce,
        ciphertext,
        tag,
    }
    .encode();
    progress.report(100);
    Ok(encoded)
}

/// Decrypt a container produced by [`encrypt`].
pub fn decrypt(password: &[u8], bytes: &[u8]) -> Result<Vec<u8>> {
    decrypt_with_progress(password, bytes, &mut |_percent: u8| {})
}

/// Decrypt a container, reporting progress to the given observer.
pub fn decrypt_with_progress(
    password: &[u8],
    bytes: &[u8],
    progress: &mut dyn Progress,
) -> Result<Vec<u8>> {
    progress.report(0);

    let parsed = Container::decode(bytes)?;
    progress.report(AFTER_DECODE);

    let key = kdf::derive(password, &parsed.salt)?;
    progress.report(AFTER_DERIVE);

    let aad = container::associated_data(&parsed.salt);
    let plaintext = cipher::open(&key, &parsed.nonce, &aad, &parsed.ciphertext, &parsed.tag)?;
    progress.report(AFTER_CIPHER);

    debug!(plaintext_len = plaintext.len(), "opened container");
    progress.report(100);
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{HEADER_LEN, MIN_LEN};
    use crate::error::ErrorKind;

    #[test]
    fn test_empty_plaintext() {
        let password = b"test";
        let plaintext = b"";

        let encrypted = encrypt(password, plaintext).unwrap();
        let decrypted = decrypt(password, &encrypted).unwrap();

        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_small_plaintext() {
        let password = b"test";
        let plaintext = b"hello";

        let encrypted = encrypt(password, plaintext).unwrap();
        let decrypted = decrypt(password, &encrypted).unwrap();

        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_container_length() {
        let encrypted = encrypt(b"test", b"hello").unwrap();
        assert_eq!(encrypted.len(), MIN_LEN + 5);
    }

    #[test]
    fn test_deterministic_encryption() {
        let password = b"test";
        let plaintext = b"hello world";
        let salt = [1u8; SALT_LEN];
        let nonce = [2u8; NONCE_LEN];

        let ct1 = encrypt_deterministic(password, plaintext, &salt, &nonce).unwrap();
        let ct2 = encrypt_deterministic(password, plaintext, &salt, &nonce).unwrap();

        // Same salt/nonce produces identical output
        assert_eq!(ct1, ct2);

        let pt1 = decrypt(password, &ct1).unwrap();
        assert_eq!(plaintext, &pt1[..]);
    }

    #[test]
    fn test_different_nonce_different_ciphertext() {
        let password = b"test";
        let plaintext = b"hello world";
        let salt = [1u8; SALT_LEN];

        let ct1 = encrypt_deterministic(password, plaintext, &salt, &[2u8; NONCE_LEN]).unwrap();
        let ct2 = encrypt_deterministic(password, plaintext, &salt, &[3u8; NONCE_LEN]).unwrap();

        assert_ne!(ct1, ct2);

        assert_eq!(decrypt(password, &ct1).unwrap(), plaintext);
        assert_eq!(decrypt(password, &ct2).unwrap(), plaintext);
    }

    #[test]
    fn test_wrong_password() {
        let encrypted = encrypt(b"correct", b"secret data").unwrap();

        let err = decrypt(b"wrong", &encrypted).expect_err("expected authentication failure");
        assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn test_tampered_ciphertext() {
        let password = b"test";
        let mut encrypted = encrypt(password, b"hello").unwrap();

        encrypted[HEADER_LEN] ^= 0x01; // first ciphertext byte

        let err = decrypt(password, &encrypted).expect_err("expected authentication failure");
        assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn test_tampered_salt() {
        let password = b"test";
        let mut encrypted = encrypt(password, b"hello").unwrap();

        // salt starts at offset 5; a different salt derives a different
        // key and breaks the associated data, either of which must fail
        // authentication
        encrypted[5] ^= 0x01;

        let err = decrypt(password, &encrypted).expect_err("expected authentication failure");
        assert_eq!(err.kind, ErrorKind::AuthenticationFailed);
    }

    #[test]
    fn test_trailing_data() {
        let password = b"test";
        let mut encrypted = encrypt(password, b"hello").unwrap();
        encrypted.push(0xFF);

        let err = decrypt(password, &encrypted).expect_err("expected malformed rejection");
        assert_eq!(err.kind, ErrorKind::MalformedContainer);
    }

    #[test]
    fn test_all_byte_values() {
        let password = b"test";
        let plaintext: Vec<u8> = (0..=255).collect();

        let encrypted = encrypt(password, &plaintext).unwrap();
        let decrypted = decrypt(password, &encrypted).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_large_plaintext() {
        let password = b"test";
        let plaintext = vec![0x42u8; 128 * 1024]; // 128KB

        let encrypted = encrypt(password, &plaintext).unwrap();
        let decrypted = decrypt(password, &encrypted).unwrap();

        assert_eq!(plaintext, decrypted);
    }

    #[test]
    fn test_progress_sequence() {
        let password = b"test";

        let mut reports: Vec<u8> = Vec::new();
        let encrypted =
            encrypt_with_progress(password, b"hello", &mut |percent: u8| reports.push(percent))
                .unwrap();

        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.iter().filter(|&&p| p == 100).count(), 1);
        assert_eq!(reports.last(), Some(&100));

        reports.clear();
        decrypt_with_progress(password, &encrypted, &mut |percent: u8| {
            reports.push(percent)
        })
        .unwrap();

        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.iter().filter(|&&p| p == 100).count(), 1);
        assert_eq!(reports.last(), Some(&100));
    }

    #[test]
    fn test_no_terminal_progress_on_failure() {
        let mut reports: Vec<u8> = Vec::new();
        let result = decrypt_with_progress(b"test", b"not a container", &mut |percent: u8| {
            reports.push(percent)
        });

        assert!(result.is_err());
        assert!(!reports.contains(&100));
    }
}
