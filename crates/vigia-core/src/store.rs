//! The `DocumentStore` trait.
//!
//! Implemented by storage backends (e.g. `vigia-store-sqlite`). The engine
//! crate depends on this abstraction, not on any concrete backend.
//!
//! State mutations are exposed only as *transitions*: a state write paired
//! with its audit entry in one local transaction. There is no way to change
//! a state without producing exactly one [`AuditLogEntry`], and no way to
//! update or delete an entry once written.

use std::future::Future;

use uuid::Uuid;

use crate::{
  assignment::{Assignment, AssignmentKind, Entity, NewAssignment, Resource},
  audit::{AuditFilter, AuditLogEntry, NewAuditEntry},
  dates::DateTriple,
  document::{Document, NewDocument},
  state::{State, StateCatalog},
};

/// Abstraction over a Vigia storage backend.
///
/// All methods return `Send` futures so the trait can be used from
/// multi-threaded async runtimes.
pub trait DocumentStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Catalog ───────────────────────────────────────────────────────────

  /// Insert one immutable state catalog row.
  fn insert_state(
    &self,
    state: State,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Load the full state catalog. Fails on duplicate codes.
  fn load_catalog(
    &self,
  ) -> impl Future<Output = Result<StateCatalog, Self::Error>> + Send + '_;

  // ── Holders ───────────────────────────────────────────────────────────

  fn insert_resource(
    &self,
    display_name: String,
  ) -> impl Future<Output = Result<Resource, Self::Error>> + Send + '_;

  fn insert_entity(
    &self,
    display_name: String,
  ) -> impl Future<Output = Result<Entity, Self::Error>> + Send + '_;

  /// Deactivate a resource or entity; its assignments drop out of rollups.
  fn set_holder_active(
    &self,
    holder_id: Uuid,
    kind: AssignmentKind,
    active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Documents ─────────────────────────────────────────────────────────

  fn insert_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Retrieve a document by UUID. Returns `None` if not found.
  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  fn list_documents(
    &self,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  // ── Assignments ───────────────────────────────────────────────────────

  fn insert_assignment(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// List assignments, optionally restricted to one document and/or one
  /// join-table kind.
  fn list_assignments(
    &self,
    document_id: Option<Uuid>,
    kind: Option<AssignmentKind>,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  /// Replace an assignment's date triple (re-emission, corrections).
  fn set_assignment_dates(
    &self,
    assignment_id: Uuid,
    kind: AssignmentKind,
    dates: DateTriple,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Transitions ───────────────────────────────────────────────────────

  /// Persist a new state on an assignment row and append its audit entry,
  /// atomically. A failure leaves both untouched and affects no other row.
  fn apply_assignment_transition(
    &self,
    assignment_id: Uuid,
    kind: AssignmentKind,
    new_state_id: Uuid,
    audit: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditLogEntry, Self::Error>> + Send + '_;

  /// Persist a new state on a universal document's own state field and
  /// append its audit entry, atomically.
  fn apply_document_transition(
    &self,
    document_id: Uuid,
    new_state_id: Uuid,
    audit: NewAuditEntry,
  ) -> impl Future<Output = Result<AuditLogEntry, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// The live assignment state ids for a document: both join tables, active
  /// holders only, rows with a state set. Input to the critical-state
  /// aggregator.
  fn assignment_states(
    &self,
    document_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

  /// Query the append-only audit trail.
  fn get_audit_log<'a>(
    &'a self,
    filter: &'a AuditFilter,
  ) -> impl Future<Output = Result<Vec<AuditLogEntry>, Self::Error>> + Send + 'a;
}
