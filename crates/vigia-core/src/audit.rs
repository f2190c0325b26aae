//! The audit trail of state transitions.
//!
//! Entries are immutable and strictly append-only. Every state mutation the
//! reconciliation service (or an administrative override) performs is paired
//! with exactly one entry; no update or delete operation exists anywhere.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Who and how ─────────────────────────────────────────────────────────────

/// Who caused a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Actor {
  User(Uuid),
  Automatic,
}

impl Actor {
  pub fn user_id(self) -> Option<Uuid> {
    match self {
      Self::User(id) => Some(id),
      Self::Automatic => None,
    }
  }
}

/// Whether a run was requested by an operator or fired by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
  Manual,
  Automatic,
}

/// Which kind of row a transition touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditKind {
  Resource,
  Entity,
  /// A universal document's own state field.
  Universal,
}

impl From<crate::assignment::AssignmentKind> for AuditKind {
  fn from(kind: crate::assignment::AssignmentKind) -> Self {
    match kind {
      crate::assignment::AssignmentKind::Resource => Self::Resource,
      crate::assignment::AssignmentKind::Entity => Self::Entity,
    }
  }
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// One immutable transition record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
  pub entry_id:          Uuid,
  pub kind:              AuditKind,
  pub document_id:       Uuid,
  /// The resource or entity UUID; `None` for universal-document entries.
  pub holder_id:         Option<Uuid>,
  /// `None` when the row had no state before this transition.
  pub previous_state_id: Option<Uuid>,
  pub new_state_id:      Uuid,
  pub reason:            String,
  pub actor:             Actor,
  pub mode:              RunMode,
  /// Server-assigned timestamp; never changes after creation.
  pub recorded_at:       DateTime<Utc>,
}

/// Input to [`crate::store::DocumentStore::apply_assignment_transition`] and
/// friends. `entry_id` and `recorded_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub kind:              AuditKind,
  pub document_id:       Uuid,
  pub holder_id:         Option<Uuid>,
  pub previous_state_id: Option<Uuid>,
  pub new_state_id:      Uuid,
  pub reason:            String,
  pub actor:             Actor,
  pub mode:              RunMode,
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::DocumentStore::get_audit_log`].
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
  pub document_id:     Option<Uuid>,
  pub holder_id:       Option<Uuid>,
  pub kind:            Option<AuditKind>,
  /// Restrict to transitions performed by this user.
  pub actor_user_id:   Option<Uuid>,
  pub recorded_after:  Option<DateTime<Utc>>,
  pub recorded_before: Option<DateTime<Utc>>,
  pub limit:           Option<usize>,
  pub offset:          Option<usize>,
}
