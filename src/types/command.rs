//! Script commands
//!
//! A command script drives the engines from a file. Correlation ids are only
//! known once a transaction exists, so script rows name transactions with a
//! caller-chosen `reference` instead; the processor maps references to
//! correlation ids as it goes.

use super::participant::ParticipantId;
use super::transaction::CreateTransaction;

/// One parsed script row
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a transaction and remember it under `reference`
    Create {
        reference: String,
        request: CreateTransaction,
    },

    /// Resolve the transaction created under `reference`
    Resolve {
        reference: String,
        initiator: ParticipantId,
        description: Option<String>,
    },
}

impl Command {
    pub fn reference(&self) -> &str {
        match self {
            Command::Create { reference, .. } | Command::Resolve { reference, .. } => reference,
        }
    }

    pub fn op(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Resolve { .. } => "resolve",
        }
    }
}
