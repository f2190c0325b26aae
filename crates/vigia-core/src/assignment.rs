//! Assignments — the normalized joins between documents and their holders.
//!
//! A resource (a tracked person) or an entity (a destination organization)
//! is required to hold certain documents. The assignment row carries the
//! per-holder date triple and state, unless the document is universal, in
//! which case the document's own values are authoritative.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::DateTriple;

// ─── Holders ─────────────────────────────────────────────────────────────────

/// A tracked person who may be required to hold documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
  pub resource_id:  Uuid,
  pub display_name: String,
  /// Deactivated resources keep their rows but drop out of rollups.
  pub active:       bool,
}

/// An external organization that is a destination for documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
  pub entity_id:    Uuid,
  pub display_name: String,
  pub active:       bool,
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// Which join table an assignment lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
  Resource,
  Entity,
}

/// One Document × Resource or Document × Entity row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
  pub assignment_id: Uuid,
  pub document_id:   Uuid,
  /// The resource or entity UUID, depending on `kind`.
  pub holder_id:     Uuid,
  pub kind:          AssignmentKind,
  pub dates:         DateTriple,
  pub state_id:      Option<Uuid>,
}

/// Input to [`crate::store::DocumentStore::insert_assignment`].
/// The `assignment_id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAssignment {
  pub document_id: Uuid,
  pub holder_id:   Uuid,
  pub kind:        AssignmentKind,
  pub dates:       DateTriple,
  pub state_id:    Option<Uuid>,
}
