//! Transaction fan-out
//!
//! Creating a transaction writes one independent copy into every participant
//! involved. The work is split in two so the async engine can drive the
//! same steps:
//!
//! 1. [`plan_fan_out`] resolves every participant before anything is
//!    written. An unknown id fails here, with no partial writes.
//! 2. [`deliver`] (or [`deliver_one`] per participant) writes the copies in
//!    plan order, target first, then creator, then customer. A failure
//!    stops the remaining deliveries; copies already written stay.

use crate::core::consistency::{apply_with_retry, partial_failure, RetryPolicy};
use crate::core::traits::ParticipantStore;
use crate::types::{
    CopyRole, CorrelationId, CreateTransaction, CustomerRef, LedgerError, Participant,
    ParticipantId, TransactionCopy,
};
use tracing::{debug, info};

/// Who receives a copy, and in which role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub participant: ParticipantId,
    pub role: CopyRole,
}

/// A resolved fan-out, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct FanOutPlan {
    /// The record returned to the caller (the creator's view)
    pub canonical: TransactionCopy,
    /// Deliveries in write order, one per distinct participant
    pub deliveries: Vec<Delivery>,
}

impl FanOutPlan {
    pub fn correlation_id(&self) -> CorrelationId {
        self.canonical.correlation_id
    }

    /// The copy a given delivery stores
    pub fn copy_for(&self, delivery: &Delivery) -> TransactionCopy {
        self.canonical.copy_for(delivery.role)
    }
}

fn resolve<S>(store: &S, role: &str, id: &str) -> Result<Participant, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    store
        .find(id)?
        .ok_or_else(|| LedgerError::invalid_reference(role, id))
}

/// Resolve participants and build the canonical record and delivery order
///
/// # Errors
///
/// - `InvalidReference` if the target, creator or customer does not exist
/// - any store read failure
pub fn plan_fan_out<S>(
    store: &S,
    request: &CreateTransaction,
    correlation_id: CorrelationId,
) -> Result<FanOutPlan, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let target = resolve(store, "target", &request.target)?;
    let creator = resolve(store, "creator", &request.creator)?;
    let customer = match request.customer.as_deref() {
        Some(id) => Some(resolve(store, "customer", id)?),
        None => None,
    };

    let canonical = TransactionCopy {
        correlation_id,
        role: CopyRole::CreatedBy,
        created_by_id: creator.id.clone(),
        created_by_name: creator.display_name(),
        created_for_id: target.id.clone(),
        created_for_name: target.display_name(),
        customer: customer.as_ref().map(|c| CustomerRef {
            id: c.id.clone(),
            name: c.display_name(),
        }),
        images: request.images.clone(),
        description: request.description.clone(),
    };

    // A participant playing two parts gets a single copy; creating for
    // yourself is recorded as created-by.
    let mut deliveries = Vec::with_capacity(3);
    if creator.id == target.id {
        deliveries.push(Delivery {
            participant: creator.id.clone(),
            role: CopyRole::CreatedBy,
        });
    } else {
        deliveries.push(Delivery {
            participant: target.id.clone(),
            role: CopyRole::CreatedFor,
        });
        deliveries.push(Delivery {
            participant: creator.id.clone(),
            role: CopyRole::CreatedBy,
        });
    }
    if let Some(customer) = customer {
        if !deliveries.iter().any(|d| d.participant == customer.id) {
            deliveries.push(Delivery {
                participant: customer.id,
                role: CopyRole::Customer,
            });
        }
    }

    Ok(FanOutPlan {
        canonical,
        deliveries,
    })
}

/// Write one delivery's copy into its participant's current list
pub fn deliver_one<S>(
    store: &S,
    plan: &FanOutPlan,
    delivery: &Delivery,
    policy: &RetryPolicy,
) -> Result<(), LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let copy = plan.copy_for(delivery);
    apply_with_retry(store, &delivery.participant, policy, |participant| {
        participant.push_current(copy.clone())
    })?;
    debug!(
        correlation_id = %plan.correlation_id(),
        participant = %delivery.participant,
        role = ?delivery.role,
        "delivered transaction copy"
    );
    Ok(())
}

/// Write every delivery in plan order
///
/// # Returns
///
/// The canonical record, matching every stored copy.
///
/// # Errors
///
/// The first failing delivery stops the fan-out. If earlier deliveries
/// were persisted the error is `PartialFanOut` naming them; otherwise it is
/// the delivery's own error.
pub fn deliver<S>(
    store: &S,
    plan: FanOutPlan,
    policy: &RetryPolicy,
) -> Result<TransactionCopy, LedgerError>
where
    S: ParticipantStore + ?Sized,
{
    let mut persisted = Vec::with_capacity(plan.deliveries.len());
    for delivery in &plan.deliveries {
        if let Err(e) = deliver_one(store, &plan, delivery, policy) {
            return Err(partial_failure(plan.correlation_id(), persisted, e));
        }
        persisted.push(delivery.participant.clone());
    }

    info!(
        correlation_id = %plan.correlation_id(),
        participants = persisted.len(),
        "transaction created"
    );
    Ok(plan.canonical)
}
