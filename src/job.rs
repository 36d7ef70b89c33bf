//! File-job boundary consumed by the presentation layer
//!
//! A host hands over file bytes, a mode and a password; it receives
//! output bytes plus a suggested filename, or a typed failure. Batches
//! run sequentially and one failed file never aborts the rest.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::{self, Progress};
use crate::error::Result;

/// Suffix appended to encrypted output filenames
pub const ENCRYPTED_SUFFIX: &str = ".vault";

/// Prefix applied on decrypt when the input name lacks the suffix
pub const DECRYPTED_PREFIX: &str = "decrypted_";

/// Direction of a file job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Encrypt,
    Decrypt,
}

/// Suggested output filename for a processed file.
///
/// Encrypting appends [`ENCRYPTED_SUFFIX`]; decrypting strips it, or
/// falls back to [`DECRYPTED_PREFIX`] when the suffix is absent. A name
/// consisting of the bare suffix is treated as suffix-absent so the
/// result is never empty.
pub fn output_name(input_name: &str, mode: Mode) -> String {
    match mode {
        Mode::Encrypt => format!("{input_name}{ENCRYPTED_SUFFIX}"),
        Mode::Decrypt => match input_name.strip_suffix(ENCRYPTED_SUFFIX) {
            Some(stem) if !stem.is_empty() => stem.to_owned(),
            _ => format!("{DECRYPTED_PREFIX}{input_name}"),
        },
    }
}

/// A file submitted for processing.
#[derive(Debug, Clone)]
pub struct FileRequest {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// A successfully processed file.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    /// Suggested output filename (see [`output_name`]).
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Process a single file.
pub fn process_file(
    request: &FileRequest,
    password: &str,
    mode: Mode,
    progress: &mut dyn Progress,
) -> Result<ProcessedFile> {
    let bytes = match mode {
        Mode::Encrypt => {
            engine::encrypt_with_progress(password.as_bytes(), &request.bytes, progress)?
        }
        Mode::Decrypt => {
            engine::decrypt_with_progress(password.as_bytes(), &request.bytes, progress)?
        }
    };
    Ok(ProcessedFile {
        name: output_name(&request.name, mode),
        bytes,
    })
}

/// Callbacks for batch processing.
///
/// All methods have no-op defaults. `cancel_requested` is polled
/// between files only; a file already being processed runs to
/// completion. Once [`process_batch`] returns, the observer is released
/// and no further callbacks can fire.
pub trait BatchObserver {
    fn on_file_progress(&mut self, _name: &str, _percent: u8) {}
    fn on_file_done(&mut self, _name: &str, _outcome: &Result<ProcessedFile>) {}
    fn cancel_requested(&self) -> bool {
        false
    }
}

/// Observer that ignores everything.
pub struct SilentObserver;

impl BatchObserver for SilentObserver {}

/// Per-file outcome within a batch.
#[derive(Debug)]
pub struct FileResult {
    pub name: String,
    pub outcome: Result<ProcessedFile>,
}

/// Accumulated results of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<FileResult>,
    /// True when the observer requested cancellation before all files
    /// were attempted.
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_err()).count()
    }
}

/// Process a batch of files sequentially with one shared password.
///
/// Jobs are independent computations over their own buffers; a failure
/// is recorded in the report and processing moves on to the next file.
/// The report is accumulated by this single loop, so no synchronization
/// is needed around it.
pub fn process_batch(
    requests: &[FileRequest],
    password: &str,
    mode: Mode,
    observer: &mut dyn BatchObserver,
) -> BatchReport {
    let mut report = BatchReport::default();

    for request in requests {
        if observer.cancel_requested() {
            report.cancelled = true;
            break;
        }

        let name = request.name.clone();
        let outcome = {
            let mut forward = |percent: u8| observer.on_file_progress(&name, percent);
            process_file(request, password, mode, &mut forward)
        };

        match &outcome {
            Ok(_) => info!(file = %name, ?mode, "file processed"),
            Err(e) => warn!(file = %name, ?mode, error = %e, "file failed"),
        }
        observer.on_file_done(&name, &outcome);
        report.results.push(FileResult { name, outcome });
    }

    report
}
