//! Asynchronous orchestration
//!
//! The async engine runs the same fan-out and resolution steps as the
//! synchronous engine, with blocking store calls moved onto tokio's blocking
//! pool.
//!
//! # Architecture
//!
//! - **AsyncTransactionEngine**: Drives one create or resolve across tasks
//! - **BatchProcessor**: Runs script batches, one task per transaction reference
//!
//! # Thread Safety
//!
//! Both types are cheap to clone and share their state through `Arc`.
//! Commands on different references proceed in parallel; concurrent writes
//! to one participant are serialized by its version check.

pub mod batch_processor;
pub mod engine;

pub use batch_processor::BatchProcessor;
pub use engine::AsyncTransactionEngine;
