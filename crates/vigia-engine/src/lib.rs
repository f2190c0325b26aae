//! The Vigia reconciliation engine.
//!
//! Ties the pure evaluator and aggregator from `vigia-core` to a
//! [`DocumentStore`](vigia_core::store::DocumentStore) backend: the
//! [`Reconciler`] walks every assignment and universal document, persists the
//! decided transitions, and the [`Scheduler`] fires it periodically without
//! ever letting two runs overlap.

pub mod error;
pub mod reconcile;
pub mod scheduler;

pub use error::Error;
pub use reconcile::{ChangeDetail, Reconciler, RunSummary};
pub use scheduler::Scheduler;
