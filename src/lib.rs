//! Job Ledger Library
//! # Overview
//!
//! Keeps a denormalized copy of every transaction in each participant's own
//! record. A transaction is created by one participant for another (with an
//! optional customer attached), written into every involved participant's
//! current list under a shared correlation id, and later resolved: every
//! copy moves to its participant's past list.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Participants, transaction copies, requests, commands and errors
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::fanout`] - Writing a new transaction into every participant
//!   - [`core::resolution`] - Moving every copy to the past lists
//!   - [`core::consistency`] - Optimistic retry and best-effort propagation
//!   - [`core::engine`] / [`core::r#async`] - Sync and async orchestration
//!   - [`core::queries`] - Listings, counterparts and copy location
//! - [`io`] - Script, participant seed and report CSV handling
//! - [`strategy`] - Complete processing pipelines
//!
//! # Consistency
//!
//! Copies live in independent participant documents and no write spans two
//! of them. Creation writes target, then creator, then customer, and reports
//! a partial fan-out if it stops midway. Resolution must succeed for its
//! initiator; every other participant is best-effort, and resolving again
//! repairs a participant that lagged behind.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod strategy;
pub mod telemetry;
pub mod types;

pub use core::{
    AsyncTransactionEngine, FileParticipantStore, MemoryParticipantStore, ParticipantStore,
    ResolutionReport, TransactionEngine,
};
pub use io::write_participants_csv;
pub use types::{
    Command, CopyRole, CorrelationId, CreateTransaction, LedgerError, Participant, ParticipantId,
    ResolveTransaction, Role, TransactionCopy,
};
