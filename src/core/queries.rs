//! Read-side queries over participant records
//!
//! None of these mutate anything. `locate_copies` is the consistency probe:
//! it shows where every copy of a transaction currently sits, which is how a
//! split left behind by a partial resolution is found.

use crate::core::traits::ParticipantStore;
use crate::types::{CorrelationId, LedgerError, Participant, ParticipantId, Role, TransactionCopy};

/// One participant's transaction list, with the participant's role
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionListing {
    pub role: Role,
    pub transactions: Vec<TransactionCopy>,
}

/// Participants a given participant can address, grouped by role
#[derive(Debug, Clone, PartialEq)]
pub struct Counterparts {
    pub role: Role,
    pub designers: Vec<Participant>,
    pub workers: Vec<Participant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyState {
    Current,
    Past,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyLocation {
    pub participant: ParticipantId,
    pub state: CopyState,
}

fn require<S>(store: &S, id: &str) -> Result<Participant, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    store
        .find(id)?
        .ok_or_else(|| LedgerError::participant_not_found(id))
}

pub fn current_transactions<S>(store: &S, id: &str) -> Result<TransactionListing, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let participant = require(store, id)?;
    Ok(TransactionListing {
        role: participant.role,
        transactions: participant.current_transactions,
    })
}

pub fn past_transactions<S>(store: &S, id: &str) -> Result<TransactionListing, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let participant = require(store, id)?;
    Ok(TransactionListing {
        role: participant.role,
        transactions: participant.past_transactions,
    })
}

/// Designers and/or workers this participant's role can address
///
/// Results are sorted by id.
pub fn counterparts<S>(store: &S, id: &str) -> Result<Counterparts, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let participant = require(store, id)?;
    let allowed = participant.role.counterparts();

    let mut everyone = store.list()?;
    everyone.sort_by(|a, b| a.id.cmp(&b.id));

    let mut result = Counterparts {
        role: participant.role,
        designers: Vec::new(),
        workers: Vec::new(),
    };
    for other in everyone.into_iter().filter(|p| allowed.contains(&p.role)) {
        match other.role {
            Role::Designer => result.designers.push(other),
            Role::Worker => result.workers.push(other),
            Role::Customer => {}
        }
    }
    Ok(result)
}

/// Participants who created transactions a designer currently holds
///
/// # Errors
///
/// `ParticipantNotFound` if the id is missing or is not a designer.
pub fn designer_customers<S>(store: &S, designer_id: &str) -> Result<Vec<Participant>, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let designer = require(store, designer_id)?;
    if designer.role != Role::Designer {
        return Err(LedgerError::participant_not_found(designer_id));
    }

    let mut creators: Vec<&str> = Vec::new();
    for copy in &designer.current_transactions {
        let creator = copy.created_by_id.as_str();
        if creator != designer_id && !creators.contains(&creator) {
            creators.push(creator);
        }
    }

    let mut customers = Vec::with_capacity(creators.len());
    for id in creators {
        if let Some(participant) = store.find(id)? {
            customers.push(participant);
        }
    }
    Ok(customers)
}

/// Where every copy of a transaction currently lives, sorted by participant
pub fn locate_copies<S>(
    store: &S,
    correlation_id: &CorrelationId,
) -> Result<Vec<CopyLocation>, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let mut locations = Vec::new();
    for participant in store.list()? {
        if participant.find_current(correlation_id).is_some() {
            locations.push(CopyLocation {
                participant: participant.id.clone(),
                state: CopyState::Current,
            });
        }
        if participant.find_past(correlation_id).is_some() {
            locations.push(CopyLocation {
                participant: participant.id,
                state: CopyState::Past,
            });
        }
    }
    locations.sort_by(|a, b| a.participant.cmp(&b.participant));
    Ok(locations)
}
