//! Core business logic module
//!
//! This module contains the transaction processing components:
//! - `traits` - Store and id generator abstractions
//! - `participant_store` - In-memory participant store
//! - `file_store` - One JSON document per participant on disk
//! - `consistency` - Retry, partial-failure and propagation policy
//! - `fanout` - Writing a new transaction into every participant
//! - `resolution` - Moving every copy of a transaction to the past lists
//! - `queries` - Read-side listings and consistency probes
//! - `engine` - Synchronous orchestration
//! - `script` - Script references and command execution
//! - `async` - Asynchronous orchestration and batch processing

pub mod consistency;
pub mod engine;
pub mod fanout;
pub mod file_store;
pub mod participant_store;
pub mod queries;
pub mod resolution;
pub mod script;
pub mod traits;
pub mod r#async;

#[cfg(test)]
pub(crate) mod testing;

pub use consistency::{ResolutionReport, RetryPolicy, SecondaryOutcome, SecondaryStep};
pub use engine::TransactionEngine;
pub use file_store::FileParticipantStore;
pub use participant_store::MemoryParticipantStore;
pub use r#async::{AsyncTransactionEngine, BatchProcessor};
pub use script::{CommandOutcome, ProcessingResult, ReferenceRegistry};
pub use traits::{IdGenerator, ParticipantStore, RandomIdGenerator};
