//! Transaction resolution
//!
//! Resolving moves every copy of a transaction from its participant's
//! current list to its past list. The initiator's move is authoritative:
//! it must succeed or the whole resolution fails. The other participants
//! referenced by the copy are then visited independently, each a
//! best-effort step whose outcome is recorded but never turned into an
//! error.

use crate::core::consistency::{
    apply_with_retry, ResolutionReport, RetryPolicy, SecondaryOutcome, SecondaryStep,
};
use crate::core::traits::ParticipantStore;
use crate::types::{CorrelationId, LedgerError, ParticipantId, ResolveTransaction, TransactionCopy};
use tracing::{debug, info};

/// Move the initiator's copy to its past list
///
/// The copy is located by exact correlation id. The description override,
/// if any, is applied before the move.
///
/// # Errors
///
/// - `ParticipantNotFound` if the initiator does not exist
/// - `TransactionNotFound` if the initiator holds no current copy
/// - any persistence failure on the initiator's save
pub fn resolve_primary<S>(
    store: &S,
    request: &ResolveTransaction,
    policy: &RetryPolicy,
) -> Result<TransactionCopy, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let copy = apply_with_retry(store, &request.initiator, policy, |participant| {
        participant.archive(
            &request.correlation_id,
            request.description_override.as_deref(),
        )
    })?;
    debug!(
        correlation_id = %request.correlation_id,
        participant = %request.initiator,
        "initiator copy archived"
    );
    Ok(copy)
}

/// Participants other than the initiator referenced by a resolved copy
///
/// Created-by, created-for, then customer; de-duplicated.
pub fn secondary_participants(copy: &TransactionCopy, initiator: &str) -> Vec<ParticipantId> {
    copy.participant_ids()
        .into_iter()
        .filter(|id| *id != initiator)
        .map(str::to_string)
        .collect()
}

/// Best-effort archive of one secondary participant's copy
pub fn archive_secondary<S>(
    store: &S,
    participant: &str,
    correlation_id: &CorrelationId,
    description_override: Option<&str>,
    policy: &RetryPolicy,
) -> SecondaryOutcome
where
    S: ParticipantStore + ?Sized,
{
    let result = apply_with_retry(store, participant, policy, |record| {
        record.archive(correlation_id, description_override)
    });
    SecondaryOutcome::from_result(participant, result)
}

/// Visit every secondary participant in turn
pub fn propagate<S>(
    store: &S,
    copy: &TransactionCopy,
    request: &ResolveTransaction,
    policy: &RetryPolicy,
) -> Vec<SecondaryStep>
where
    S: ParticipantStore + ?Sized,
{
    secondary_participants(copy, &request.initiator)
        .into_iter()
        .map(|participant| {
            let outcome = archive_secondary(
                store,
                &participant,
                &request.correlation_id,
                request.description_override.as_deref(),
                policy,
            );
            SecondaryStep {
                participant,
                outcome,
            }
        })
        .collect()
}

/// Resolve a transaction across all of its participants
///
/// # Errors
///
/// Only the initiator's step can fail the operation; see
/// [`resolve_primary`].
pub fn resolve<S>(
    store: &S,
    request: &ResolveTransaction,
    policy: &RetryPolicy,
) -> Result<ResolutionReport, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let transaction = resolve_primary(store, request, policy)?;
    let secondaries = propagate(store, &transaction, request, policy);
    let report = ResolutionReport {
        transaction,
        secondaries,
    };
    log_resolution(&report);
    Ok(report)
}

pub(crate) fn log_resolution(report: &ResolutionReport) {
    info!(
        correlation_id = %report.transaction.correlation_id,
        archived = report.archived_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "transaction resolved"
    );
}
