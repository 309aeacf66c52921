//! Error types for the ledger
//!
//! This module defines all error types that can occur while creating and
//! resolving transactions, and while reading command scripts.
//!
//! # Error Categories
//!
//! - **Lookup Errors**: participant or transaction copy absent
//! - **Reference Errors**: a supplied participant id does not resolve
//! - **Persistence Errors**: a participant save failed, conflicted or timed out
//! - **Partial Success**: a fan-out persisted some copies before failing
//! - **Input Errors**: file, CSV and script problems

use super::participant::ParticipantId;
use super::transaction::CorrelationId;
use thiserror::Error;

/// Broad classification of a [`LedgerError`]
///
/// Callers map this to whatever status scheme their surface uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidReference,
    PersistenceFailure,
    Conflict,
    PartialSuccess,
    Input,
}

/// Main error type for the ledger
///
/// Each variant carries the participant and/or transaction involved so a
/// caller can report exactly what failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Participant does not exist in the store
    #[error("Participant {participant} not found")]
    ParticipantNotFound { participant: ParticipantId },

    /// Participant holds no current copy of the transaction
    #[error("Transaction {correlation_id} not found for participant {participant}")]
    TransactionNotFound {
        participant: ParticipantId,
        correlation_id: CorrelationId,
    },

    /// A participant id supplied to fan-out does not resolve
    #[error("Invalid {role} reference: participant {participant} does not exist")]
    InvalidReference {
        /// Which request field carried the id (creator, target, customer)
        role: String,
        participant: ParticipantId,
    },

    /// Storage write or read failed
    #[error("Persistence failure for participant {participant}: {message}")]
    PersistenceFailure {
        participant: ParticipantId,
        message: String,
    },

    /// Optimistic concurrency check rejected a save
    ///
    /// Engines retry this internally; it only surfaces once the retry
    /// budget is spent.
    #[error("Version conflict for participant {participant}: expected {expected}, found {actual}")]
    VersionConflict {
        participant: ParticipantId,
        expected: u64,
        actual: u64,
    },

    /// A storage step did not finish within the configured limit
    ///
    /// The write may still land; nothing is undone.
    #[error("Storage step for participant {participant} timed out")]
    StepTimeout { participant: ParticipantId },

    #[error("Participant {participant} already exists")]
    DuplicateParticipant { participant: ParticipantId },

    #[error("Participant {participant} already holds transaction {correlation_id}")]
    DuplicateTransaction {
        participant: ParticipantId,
        correlation_id: CorrelationId,
    },

    /// Fan-out failed after some copies were already persisted
    ///
    /// The persisted copies are not rolled back.
    #[error(
        "Transaction {correlation_id} partially created (persisted for: {}): {source}",
        persisted.join(", ")
    )]
    PartialFanOut {
        correlation_id: CorrelationId,
        persisted: Vec<ParticipantId>,
        source: Box<LedgerError>,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },

    /// Script row could not be turned into a command
    #[error("Invalid command '{op}': {message}")]
    InvalidCommand { op: String, message: String },

    /// Script resolves a reference no earlier row created
    #[error("Unknown transaction reference '{reference}'")]
    UnknownReference { reference: String },

    #[error("Transaction reference '{reference}' is already in use")]
    DuplicateReference { reference: String },
}

impl From<std::io::Error> for LedgerError {
    fn from(error: std::io::Error) -> Self {
        LedgerError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LedgerError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LedgerError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for LedgerError {
    fn from(error: csv_async::Error) -> Self {
        LedgerError::ParseError {
            line: None,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(error: serde_json::Error) -> Self {
        LedgerError::Serialization {
            message: error.to_string(),
        }
    }
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::ParticipantNotFound { .. }
            | LedgerError::TransactionNotFound { .. }
            | LedgerError::UnknownReference { .. } => ErrorKind::NotFound,
            LedgerError::InvalidReference { .. } => ErrorKind::InvalidReference,
            LedgerError::PersistenceFailure { .. }
            | LedgerError::StepTimeout { .. }
            | LedgerError::IoError { .. }
            | LedgerError::Serialization { .. } => ErrorKind::PersistenceFailure,
            LedgerError::VersionConflict { .. }
            | LedgerError::DuplicateParticipant { .. }
            | LedgerError::DuplicateTransaction { .. }
            | LedgerError::DuplicateReference { .. } => ErrorKind::Conflict,
            LedgerError::PartialFanOut { .. } => ErrorKind::PartialSuccess,
            LedgerError::FileNotFound { .. }
            | LedgerError::ParseError { .. }
            | LedgerError::InvalidCommand { .. } => ErrorKind::Input,
        }
    }

    /// Create a ParticipantNotFound error
    pub fn participant_not_found(participant: &str) -> Self {
        LedgerError::ParticipantNotFound {
            participant: participant.to_string(),
        }
    }

    /// Create a TransactionNotFound error
    pub fn transaction_not_found(participant: &str, correlation_id: CorrelationId) -> Self {
        LedgerError::TransactionNotFound {
            participant: participant.to_string(),
            correlation_id,
        }
    }

    /// Create an InvalidReference error
    pub fn invalid_reference(role: &str, participant: &str) -> Self {
        LedgerError::InvalidReference {
            role: role.to_string(),
            participant: participant.to_string(),
        }
    }

    /// Create a PersistenceFailure error
    pub fn persistence_failure(participant: &str, message: impl Into<String>) -> Self {
        LedgerError::PersistenceFailure {
            participant: participant.to_string(),
            message: message.into(),
        }
    }

    /// Create a VersionConflict error
    pub fn version_conflict(participant: &str, expected: u64, actual: u64) -> Self {
        LedgerError::VersionConflict {
            participant: participant.to_string(),
            expected,
            actual,
        }
    }

    /// Create a StepTimeout error
    pub fn step_timeout(participant: &str) -> Self {
        LedgerError::StepTimeout {
            participant: participant.to_string(),
        }
    }

    /// Create a DuplicateParticipant error
    pub fn duplicate_participant(participant: &str) -> Self {
        LedgerError::DuplicateParticipant {
            participant: participant.to_string(),
        }
    }

    /// Create a DuplicateTransaction error
    pub fn duplicate_transaction(participant: &str, correlation_id: CorrelationId) -> Self {
        LedgerError::DuplicateTransaction {
            participant: participant.to_string(),
            correlation_id,
        }
    }

    /// Create an InvalidCommand error
    pub fn invalid_command(op: &str, message: impl Into<String>) -> Self {
        LedgerError::InvalidCommand {
            op: op.to_string(),
            message: message.into(),
        }
    }

    /// Create an UnknownReference error
    pub fn unknown_reference(reference: &str) -> Self {
        LedgerError::UnknownReference {
            reference: reference.to_string(),
        }
    }

    /// Create a DuplicateReference error
    pub fn duplicate_reference(reference: &str) -> Self {
        LedgerError::DuplicateReference {
            reference: reference.to_string(),
        }
    }
}
