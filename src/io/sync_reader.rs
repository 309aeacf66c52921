//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over script commands from a CSV file, and
//! a loader for participant seed files. Delegates CSV format concerns to the
//! csv_format module.
//!
//! # Design
//!
//! The SyncReader uses csv::Reader to read and deserialize CSV records
//! sequentially, one at a time, without loading the entire file into memory.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<Command, LedgerError>` for each CSV row:
//!
//! ```no_run
//! use job_ledger::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("commands.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(command) => println!("Processing command: {:?}", command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual row errors are yielded as `ParseError` carrying the line
//!   number (the header is line 1)

use crate::io::open_error;
use crate::io::csv_format::{
    convert_command_record, convert_participant_record, CommandRecord, ParticipantRecord,
};
use crate::types::{Command, LedgerError, Participant};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;
use tracing::warn;

fn open_csv(path: &Path) -> Result<csv::Reader<File>, LedgerError> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;

    Ok(ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(file))
}

fn at_line(line: usize, error: LedgerError) -> LedgerError {
    LedgerError::ParseError {
        line: Some(line as u64),
        message: error.to_string(),
    }
}

/// Streaming reader over a command script
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: usize,
}

impl SyncReader {
    /// Open a command script
    ///
    /// # Errors
    ///
    /// `FileNotFound` if the path does not exist; `IoError` for any other
    /// open failure.
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        Ok(Self {
            reader: open_csv(path)?,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<Command, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CommandRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        Some(match row {
            Ok(record) => convert_command_record(record).map_err(|e| at_line(self.line_num, e)),
            Err(e) => Err(at_line(self.line_num, e.into())),
        })
    }
}

/// Load every valid row of a participant seed file
///
/// Invalid rows are logged and skipped.
///
/// # Errors
///
/// Only opening the file can fail the load.
pub fn read_participants(path: &Path) -> Result<Vec<Participant>, LedgerError> {
    let mut reader = open_csv(path)?;
    let mut participants = Vec::new();

    for (index, row) in reader.deserialize::<ParticipantRecord>().enumerate() {
        let line = index + 2;
        match row.map_err(LedgerError::from).and_then(convert_participant_record) {
            Ok(participant) => participants.push(participant),
            Err(e) => warn!(line, error = %e, "skipping participant row"),
        }
    }

    Ok(participants)
}
