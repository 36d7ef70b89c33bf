//! Vaultbox - password-based file encryption with an authenticated container
//!
//! Files are sealed with ChaCha20-Poly1305 under a key derived from the
//! user's password via scrypt, and framed in the self-describing binary
//! container documented in [`container`]. The [`job`] module is the
//! boundary a presentation layer drives; [`engine`] is the underlying
//! encrypt/decrypt pipeline.

#![forbid(unsafe_code)]

pub mod cipher;
pub mod container;
pub mod engine;
pub mod error;
pub mod file_ops;
pub mod history;
pub mod job;
pub mod kdf;
