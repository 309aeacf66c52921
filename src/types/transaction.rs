//! Transaction-related types
//!
//! A logical transaction is never stored as a single record. Each participant
//! involved holds its own [`TransactionCopy`]; copies of the same transaction
//! are tied together only by their shared [`CorrelationId`].

use super::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier shared verbatim by every copy of one logical transaction
pub type CorrelationId = Uuid;

/// The part a participant played in a transaction
///
/// Stored on each copy so a participant's copy identifies its own role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CopyRole {
    /// The participant who created the transaction
    CreatedBy,

    /// The participant the transaction was created for
    CreatedFor,

    /// The customer the job belongs to
    Customer,
}

/// Customer attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: ParticipantId,
    pub name: String,
}

/// One participant's stored view of a transaction
///
/// Every field except `role` and `description` is fixed at creation. The
/// description can be amended once, when the transaction is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCopy {
    pub correlation_id: CorrelationId,
    pub role: CopyRole,
    pub created_by_id: ParticipantId,
    pub created_by_name: String,
    pub created_for_id: ParticipantId,
    pub created_for_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionCopy {
    /// An independent copy of this transaction tagged with another role
    pub fn copy_for(&self, role: CopyRole) -> TransactionCopy {
        TransactionCopy {
            role,
            ..self.clone()
        }
    }

    /// Whether two copies carry the same content
    ///
    /// Compares everything a participant's copy shares with the others: the
    /// role tag is per-participant and the description may be amended on
    /// resolution, so neither takes part.
    pub fn content_matches(&self, other: &TransactionCopy) -> bool {
        self.correlation_id == other.correlation_id
            && self.created_by_id == other.created_by_id
            && self.created_by_name == other.created_by_name
            && self.created_for_id == other.created_for_id
            && self.created_for_name == other.created_for_name
            && self.customer == other.customer
            && self.images == other.images
    }

    /// Every participant referenced by this copy, de-duplicated, in
    /// created-by, created-for, customer order
    pub fn participant_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::with_capacity(3);
        let candidates = [
            Some(self.created_by_id.as_str()),
            Some(self.created_for_id.as_str()),
            self.customer.as_ref().map(|c| c.id.as_str()),
        ];
        for id in candidates.into_iter().flatten() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }
}

/// Request to create a transaction
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTransaction {
    pub creator: ParticipantId,
    pub target: ParticipantId,
    pub customer: Option<ParticipantId>,
    pub description: Option<String>,
    pub images: Vec<String>,
}

impl CreateTransaction {
    pub fn new(creator: impl Into<ParticipantId>, target: impl Into<ParticipantId>) -> Self {
        CreateTransaction {
            creator: creator.into(),
            target: target.into(),
            customer: None,
            description: None,
            images: Vec::new(),
        }
    }

    pub fn with_customer(mut self, customer: impl Into<ParticipantId>) -> Self {
        self.customer = Some(customer.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_images<I, T>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }
}

/// Request to resolve a transaction on behalf of one of its participants
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveTransaction {
    pub initiator: ParticipantId,
    pub correlation_id: CorrelationId,
    pub description_override: Option<String>,
}

impl ResolveTransaction {
    pub fn new(initiator: impl Into<ParticipantId>, correlation_id: CorrelationId) -> Self {
        ResolveTransaction {
            initiator: initiator.into(),
            correlation_id,
            description_override: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description_override = Some(description.into());
        self
    }
}
