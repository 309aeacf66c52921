//! Command script execution
//!
//! Maps script references to correlation ids and runs parsed commands
//! through the synchronous engine. The async batch processor shares the
//! same registry and outcome types.

use crate::core::consistency::ResolutionReport;
use crate::core::engine::TransactionEngine;
use crate::core::traits::{IdGenerator, ParticipantStore};
use crate::types::{Command, CorrelationId, LedgerError, ResolveTransaction, TransactionCopy};
use dashmap::DashMap;

/// Script reference → correlation id
#[derive(Debug, Default)]
pub struct ReferenceRegistry {
    references: DashMap<String, CorrelationId>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail if a reference is already taken
    ///
    /// Checked before a create runs, so a reused reference never produces
    /// a transaction nobody can address.
    pub fn ensure_unused(&self, reference: &str) -> Result<(), LedgerError> {
        if self.references.contains_key(reference) {
            return Err(LedgerError::duplicate_reference(reference));
        }
        Ok(())
    }

    pub fn register(
        &self,
        reference: &str,
        correlation_id: CorrelationId,
    ) -> Result<(), LedgerError> {
        use dashmap::mapref::entry::Entry;

        match self.references.entry(reference.to_string()) {
            Entry::Occupied(_) => Err(LedgerError::duplicate_reference(reference)),
            Entry::Vacant(slot) => {
                slot.insert(correlation_id);
                Ok(())
            }
        }
    }

    pub fn lookup(&self, reference: &str) -> Result<CorrelationId, LedgerError> {
        self.references
            .get(reference)
            .map(|entry| *entry.value())
            .ok_or_else(|| LedgerError::unknown_reference(reference))
    }
}

/// Successful result of one command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Created(TransactionCopy),
    Resolved(ResolutionReport),
}

/// Result of processing a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was processed
    pub command: Command,

    /// The result of processing (success or error)
    pub result: Result<CommandOutcome, LedgerError>,
}

/// Run one command through the synchronous engine
pub fn execute<S, G>(
    engine: &TransactionEngine<S, G>,
    references: &ReferenceRegistry,
    command: &Command,
) -> Result<CommandOutcome, LedgerError>
where
    S: ParticipantStore + ?Sized,
    G: IdGenerator,
{
    match command {
        Command::Create { reference, request } => {
            references.ensure_unused(reference)?;
            let created = engine.create_transaction(request.clone())?;
            references.register(reference, created.correlation_id)?;
            Ok(CommandOutcome::Created(created))
        }
        Command::Resolve {
            reference,
            initiator,
            description,
        } => {
            let correlation_id = references.lookup(reference)?;
            let mut request = ResolveTransaction::new(initiator.clone(), correlation_id);
            request.description_override = description.clone();
            engine
                .resolve_transaction(request)
                .map(CommandOutcome::Resolved)
        }
    }
}
