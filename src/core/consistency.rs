//! Consistency policy for multi-participant operations
//!
//! Fan-out and resolution touch up to three participant records, each saved
//! independently. Nothing here makes that atomic. Instead:
//!
//! - every single-participant change is one read-modify-write step, retried
//!   on version conflict against a fresh read ([`apply_with_retry`])
//! - a fan-out that fails after persisting some copies reports which ones
//!   landed ([`partial_failure`]) and leaves them in place
//! - during resolution the initiator's step must succeed; every other
//!   participant is best-effort and its result is only recorded
//!   ([`SecondaryOutcome`]), never surfaced as an error
//!
//! Re-running a resolution is always safe: participants without a matching
//! current copy are skipped, so a lagging participant can be repaired by
//! resolving again on its behalf.

use crate::core::traits::ParticipantStore;
use crate::types::{CorrelationId, LedgerError, Participant, ParticipantId, TransactionCopy};
use tracing::{debug, warn};

/// How often a single-participant step is retried on version conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 16 }
    }
}

impl RetryPolicy {
    /// Create a policy, falling back to the default for zero attempts
    pub fn new(max_attempts: u32) -> Self {
        if max_attempts == 0 {
            warn!(
                max_attempts,
                "invalid retry budget, using default ({})",
                Self::default().max_attempts
            );
            return Self::default();
        }
        Self { max_attempts }
    }
}

/// Run one read-modify-write step against a single participant
///
/// Reads the participant, applies `mutate`, and saves. On `VersionConflict`
/// the whole step is repeated against a fresh read until the retry budget is
/// spent. Any error returned by `mutate` aborts the step without saving.
///
/// # Errors
///
/// - `ParticipantNotFound` if the participant does not exist
/// - whatever `mutate` returns
/// - `VersionConflict` once the retry budget is spent
/// - any other store failure, unchanged
pub fn apply_with_retry<S, T, F>(
    store: &S,
    id: &str,
    policy: &RetryPolicy,
    mut mutate: F,
) -> Result<T, LedgerError>
where
    S: ParticipantStore + ?Sized,
    F: FnMut(&mut Participant) -> Result<T, LedgerError>,
{
    let mut attempt = 1;
    loop {
        let mut participant = store
            .find(id)?
            .ok_or_else(|| LedgerError::participant_not_found(id))?;
        let value = mutate(&mut participant)?;

        match store.save(&participant) {
            Ok(version) => {
                debug!(participant = id, version, attempt, "persisted participant");
                return Ok(value);
            }
            Err(LedgerError::VersionConflict { .. }) if attempt < policy.max_attempts => {
                debug!(participant = id, attempt, "version conflict, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Wrap a fan-out failure, recording copies that were already persisted
///
/// With nothing persisted the original error is returned unchanged, so a
/// caller can tell a clean failure from a partial one.
pub fn partial_failure(
    correlation_id: CorrelationId,
    persisted: Vec<ParticipantId>,
    source: LedgerError,
) -> LedgerError {
    if persisted.is_empty() {
        return source;
    }
    warn!(
        %correlation_id,
        persisted = ?persisted,
        error = %source,
        "fan-out stopped after partial persistence"
    );
    LedgerError::PartialFanOut {
        correlation_id,
        persisted,
        source: Box::new(source),
    }
}

/// What happened to one non-initiating participant during resolution
#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryOutcome {
    /// Copy moved to the past list and persisted
    Archived,

    /// Referenced participant no longer exists
    ParticipantMissing,

    /// Participant holds no current copy (already resolved, or never received it)
    NoCurrentCopy,

    /// Step failed; logged and otherwise ignored
    Failed(LedgerError),
}

impl SecondaryOutcome {
    /// Classify the result of a secondary archive step
    pub fn from_result(participant: &str, result: Result<TransactionCopy, LedgerError>) -> Self {
        match result {
            Ok(_) => SecondaryOutcome::Archived,
            Err(LedgerError::ParticipantNotFound { .. }) => SecondaryOutcome::ParticipantMissing,
            Err(LedgerError::TransactionNotFound { .. }) => SecondaryOutcome::NoCurrentCopy,
            Err(e) => {
                warn!(participant, error = %e, "secondary resolution step failed");
                SecondaryOutcome::Failed(e)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryStep {
    pub participant: ParticipantId,
    pub outcome: SecondaryOutcome,
}

/// Result of resolving a transaction
///
/// The initiator's move always succeeded if a report exists; the secondary
/// steps say how far propagation got.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    /// The resolved copy as recorded on the initiator
    pub transaction: TransactionCopy,
    pub secondaries: Vec<SecondaryStep>,
}

impl ResolutionReport {
    pub fn archived_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, SecondaryOutcome::Archived))
    }

    /// Participants skipped because they were missing or held no current copy
    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| {
            matches!(
                outcome,
                SecondaryOutcome::ParticipantMissing | SecondaryOutcome::NoCurrentCopy
            )
        })
    }

    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, SecondaryOutcome::Failed(_)))
    }

    /// True when no secondary step failed
    ///
    /// Skipped participants do not count against propagation: there was
    /// nothing left to move on them.
    pub fn is_fully_propagated(&self) -> bool {
        self.failed_count() == 0
    }

    fn count(&self, predicate: impl Fn(&SecondaryOutcome) -> bool) -> usize {
        self.secondaries
            .iter()
            .filter(|step| predicate(&step.outcome))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::FlakyStore;
    use crate::types::{CopyRole, Role};
    use rstest::rstest;
    use uuid::Uuid;

    fn store() -> FlakyStore {
        FlakyStore::with_participants(vec![Participant::new("w1", "Wes", "Wood", Role::Worker)])
    }

    fn report(outcomes: Vec<SecondaryOutcome>) -> ResolutionReport {
        ResolutionReport {
            transaction: TransactionCopy {
                correlation_id: Uuid::new_v4(),
                role: CopyRole::CreatedBy,
                created_by_id: "d1".to_string(),
                created_by_name: "Dana Doyle".to_string(),
                created_for_id: "w1".to_string(),
                created_for_name: "Wes Wood".to_string(),
                customer: None,
                images: Vec::new(),
                description: None,
            },
            secondaries: outcomes
                .into_iter()
                .enumerate()
                .map(|(i, outcome)| SecondaryStep {
                    participant: format!("p{i}"),
                    outcome,
                })
                .collect(),
        }
    }

    #[test]
    fn test_apply_with_retry_recovers_from_conflicts() {
        let store = store();
        store.inject_conflicts(3);

        let mut calls = 0;
        let result = apply_with_retry(&store, "w1", &RetryPolicy::default(), |participant| {
            calls += 1;
            participant.first_name = "Wesley".to_string();
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(calls, 4);
        assert_eq!(store.find("w1").unwrap().unwrap().first_name, "Wesley");
    }

    #[test]
    fn test_apply_with_retry_gives_up_after_budget() {
        let store = store();
        store.inject_conflicts(10);

        let result = apply_with_retry(&store, "w1", &RetryPolicy::new(3), |_| Ok(()));

        assert!(matches!(result, Err(LedgerError::VersionConflict { .. })));
        assert_eq!(store.find("w1").unwrap().unwrap().version, 0);
    }

    #[test]
    fn test_apply_with_retry_does_not_save_when_mutation_fails() {
        let store = store();

        let result: Result<(), _> =
            apply_with_retry(&store, "w1", &RetryPolicy::default(), |participant| {
                participant.first_name = "Changed".to_string();
                Err(LedgerError::transaction_not_found("w1", Uuid::nil()))
            });

        assert!(result.is_err());
        assert_eq!(store.find("w1").unwrap().unwrap().first_name, "Wes");
    }

    #[test]
    fn test_apply_with_retry_missing_participant() {
        let store = store();

        let result = apply_with_retry(&store, "ghost", &RetryPolicy::default(), |_| Ok(()));

        assert_eq!(result, Err(LedgerError::participant_not_found("ghost")));
    }

    #[test]
    fn test_retry_policy_zero_falls_back_to_default() {
        assert_eq!(RetryPolicy::new(0), RetryPolicy::default());
        assert_eq!(RetryPolicy::new(4).max_attempts, 4);
    }

    #[test]
    fn test_partial_failure_without_persisted_copies_is_the_source() {
        let source = LedgerError::invalid_reference("target", "w9");

        let error = partial_failure(Uuid::new_v4(), Vec::new(), source.clone());

        assert_eq!(error, source);
    }

    #[test]
    fn test_partial_failure_records_persisted_participants() {
        let id = Uuid::new_v4();
        let source = LedgerError::persistence_failure("d1", "disk full");

        let error = partial_failure(id, vec!["w1".to_string()], source.clone());

        assert_eq!(
            error,
            LedgerError::PartialFanOut {
                correlation_id: id,
                persisted: vec!["w1".to_string()],
                source: Box::new(source),
            }
        );
    }

    #[rstest]
    #[case::all_archived(vec![SecondaryOutcome::Archived, SecondaryOutcome::Archived], 2, 0, 0)]
    #[case::missing_and_absent(
        vec![SecondaryOutcome::ParticipantMissing, SecondaryOutcome::NoCurrentCopy],
        0, 2, 0
    )]
    #[case::one_failed(
        vec![
            SecondaryOutcome::Archived,
            SecondaryOutcome::Failed(LedgerError::persistence_failure("c1", "io")),
        ],
        1, 0, 1
    )]
    #[case::no_secondaries(vec![], 0, 0, 0)]
    fn test_report_counts(
        #[case] outcomes: Vec<SecondaryOutcome>,
        #[case] archived: usize,
        #[case] skipped: usize,
        #[case] failed: usize,
    ) {
        let report = report(outcomes);

        assert_eq!(report.archived_count(), archived);
        assert_eq!(report.skipped_count(), skipped);
        assert_eq!(report.failed_count(), failed);
        assert_eq!(report.is_fully_propagated(), failed == 0);
    }

    #[rstest]
    #[case(Err(LedgerError::participant_not_found("c1")), SecondaryOutcome::ParticipantMissing)]
    #[case(Err(LedgerError::transaction_not_found("c1", Uuid::nil())), SecondaryOutcome::NoCurrentCopy)]
    #[case(
        Err(LedgerError::persistence_failure("c1", "io")),
        SecondaryOutcome::Failed(LedgerError::persistence_failure("c1", "io"))
    )]
    fn test_secondary_outcome_classification(
        #[case] result: Result<TransactionCopy, LedgerError>,
        #[case] expected: SecondaryOutcome,
    ) {
        assert_eq!(SecondaryOutcome::from_result("c1", result), expected);
    }
}
