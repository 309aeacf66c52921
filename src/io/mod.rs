//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, report serialization)
//! - `sync_reader` - Synchronous command reader with iterator interface
//! - `async_reader` - Asynchronous command reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::{read_participants_async, AsyncReader};
pub use csv_format::{
    convert_command_record, convert_participant_record, write_participants_csv, CommandRecord,
    ParticipantRecord,
};
pub use sync_reader::{read_participants, SyncReader};

use crate::types::LedgerError;
use std::path::Path;

/// Map an open failure on `path` to the ledger's error type
pub(crate) fn open_error(path: &Path, error: std::io::Error) -> LedgerError {
    match error.kind() {
        std::io::ErrorKind::NotFound => LedgerError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => LedgerError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), error),
        },
    }
}
