//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `command`: Script commands read by the processing strategies
//! - `participant`: Participant records and their list operations
//! - `transaction`: Transaction copies, requests and identifiers
//! - `error`: Error types for the ledger

pub mod command;
pub mod error;
pub mod participant;
pub mod transaction;

pub use command::Command;
pub use error::{ErrorKind, LedgerError};
pub use participant::{Participant, ParticipantId, Role};
pub use transaction::{
    CopyRole, CorrelationId, CreateTransaction, CustomerRef, ResolveTransaction, TransactionCopy,
};
