//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over script commands from any
//! `futures::io::AsyncRead` source, plus an async participant seed loader.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - tokio for the async runtime (files are adapted with `tokio-util` compat)
//! - Batch reading so the batch processor can fan work out per batch
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Commands
//!                  ↓
//!           csv_format module
//!           (CommandRecord, convert_command_record)
//! ```

use crate::io::csv_format::{
    convert_command_record, convert_participant_record, CommandRecord, ParticipantRecord,
};
use crate::types::{Command, LedgerError, Participant};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

fn builder() -> AsyncReaderBuilder {
    let mut builder = AsyncReaderBuilder::new();
    builder.flexible(true).trim(csv_async::Trim::All);
    builder
}

/// Batch reader over a command script
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            csv_reader: builder().create_deserializer(reader),
            line_num: 1,
        }
    }

    /// Read up to `batch_size` valid commands
    ///
    /// Rows that fail to parse or convert are logged with their line number
    /// and skipped. An empty batch means the script is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Command> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CommandRecord>();

        while batch.len() < batch_size {
            let row = match records.next().await {
                Some(row) => row,
                None => break,
            };
            self.line_num += 1;

            match row.map_err(LedgerError::from).and_then(convert_command_record) {
                Ok(command) => batch.push(command),
                Err(e) => warn!(line = self.line_num, error = %e, "skipping command row"),
            }
        }

        batch
    }
}

/// Load every valid row of a participant seed source
///
/// Invalid rows are logged and skipped.
pub async fn read_participants_async<R>(reader: R) -> Vec<Participant>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut csv_reader = builder().create_deserializer(reader);
    let mut records = csv_reader.deserialize::<ParticipantRecord>();
    let mut participants = Vec::new();
    let mut line: u64 = 1;

    while let Some(row) = records.next().await {
        line += 1;
        match row
            .map_err(LedgerError::from)
            .and_then(convert_participant_record)
        {
            Ok(participant) => participants.push(participant),
            Err(e) => warn!(line, error = %e, "skipping participant row"),
        }
    }

    participants
}
