//! Participant-related types
//!
//! A participant owns its transaction lists exclusively. Every list mutation
//! the engines perform goes through the methods defined here, so the
//! per-participant invariants (no duplicate correlation id, copies only move
//! from current to past) hold no matter which engine drives them.

use super::error::LedgerError;
use super::transaction::{CorrelationId, TransactionCopy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Participant identifier
pub type ParticipantId = String;

/// The class of actor a participant is
///
/// Determines which other roles a participant can address when creating
/// transactions (see [`Role::counterparts`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Commissions work
    #[serde(rename = "Customer")]
    Customer,

    /// Plans the job and hands work to carpenters
    #[serde(rename = "Interior Designer")]
    Designer,

    /// Carries out the work
    #[serde(rename = "Worker/Carpenter")]
    Worker,
}

impl Role {
    /// Display label, as stored in participant documents
    pub fn label(&self) -> &'static str {
        match self {
            Role::Customer => "Customer",
            Role::Designer => "Interior Designer",
            Role::Worker => "Worker/Carpenter",
        }
    }

    /// Roles this role can address
    ///
    /// Customers work with designers and workers, designers hand jobs to
    /// workers, and workers report back to designers.
    pub fn counterparts(&self) -> &'static [Role] {
        match self {
            Role::Customer => &[Role::Designer, Role::Worker],
            Role::Designer => &[Role::Worker],
            Role::Worker => &[Role::Designer],
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "interior designer" | "designer" => Ok(Role::Designer),
            "worker/carpenter" | "worker" | "carpenter" => Ok(Role::Worker),
            other => Err(format!("Invalid participant role '{}'", other)),
        }
    }
}

/// A stored participant record
///
/// The `version` field is the optimistic-concurrency token: a store only
/// accepts a save whose version matches the stored one, then bumps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,

    /// Open transactions, in insertion order
    #[serde(default)]
    pub current_transactions: Vec<TransactionCopy>,

    /// Resolved transactions, append-only
    #[serde(default)]
    pub past_transactions: Vec<TransactionCopy>,

    #[serde(default)]
    pub version: u64,
}

impl Participant {
    /// Create a participant with empty transaction lists
    pub fn new(
        id: impl Into<ParticipantId>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        role: Role,
    ) -> Self {
        Participant {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            role,
            current_transactions: Vec::new(),
            past_transactions: Vec::new(),
            version: 0,
        }
    }

    /// Full name shown on transaction copies
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn find_current(&self, correlation_id: &CorrelationId) -> Option<&TransactionCopy> {
        self.current_transactions
            .iter()
            .find(|copy| copy.correlation_id == *correlation_id)
    }

    pub fn find_past(&self, correlation_id: &CorrelationId) -> Option<&TransactionCopy> {
        self.past_transactions
            .iter()
            .find(|copy| copy.correlation_id == *correlation_id)
    }

    /// Append a copy to the current list
    ///
    /// # Errors
    ///
    /// Returns `DuplicateTransaction` if the correlation id is already held
    /// in either list.
    pub fn push_current(&mut self, copy: TransactionCopy) -> Result<(), LedgerError> {
        if self.find_current(&copy.correlation_id).is_some()
            || self.find_past(&copy.correlation_id).is_some()
        {
            return Err(LedgerError::duplicate_transaction(
                &self.id,
                copy.correlation_id,
            ));
        }
        self.current_transactions.push(copy);
        Ok(())
    }

    /// Move a copy from the current list to the past list
    ///
    /// The copy is located by correlation id, never by position. When a
    /// description override is given it is applied before the move.
    ///
    /// # Returns
    ///
    /// The archived copy as it now sits in the past list.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if no current copy carries the correlation id
    /// - `DuplicateTransaction` if the past list already holds it
    pub fn archive(
        &mut self,
        correlation_id: &CorrelationId,
        description_override: Option<&str>,
    ) -> Result<TransactionCopy, LedgerError> {
        let index = self
            .current_transactions
            .iter()
            .position(|copy| copy.correlation_id == *correlation_id)
            .ok_or_else(|| LedgerError::transaction_not_found(&self.id, *correlation_id))?;

        if self.find_past(correlation_id).is_some() {
            return Err(LedgerError::duplicate_transaction(&self.id, *correlation_id));
        }

        let mut copy = self.current_transactions.remove(index);
        if let Some(description) = description_override {
            copy.description = Some(description.to_string());
        }
        self.past_transactions.push(copy.clone());
        Ok(copy)
    }
}
