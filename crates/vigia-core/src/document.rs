//! Document types — the compliance document catalog.
//!
//! A document is a *kind* of paper (a safety certificate, an insurance
//! policy), not an individual copy. Individual copies live on assignments,
//! except for universal documents, which define one shared set of dates and
//! one shared state for everyone they apply to.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::DateTriple;

/// The dates and state a universal document owns directly. The presence of
/// this value *is* the universal flag.
///
/// The single `state_id` is the document's displayed state; there is no
/// separate "expiration state" field kept in sync by convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniversalDates {
  pub dates:    DateTriple,
  pub state_id: Option<Uuid>,
}

/// A compliance document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  pub document_id:       Uuid,
  /// Stable lookup code, unique within the catalog.
  pub code:              String,
  pub name:              String,
  /// Calendar days from emission to expiration.
  pub validity_days:     u32,
  /// Days before expiration during which the document is flagged as about
  /// to expire.
  pub anticipation_days: u32,
  /// `Some` for a universal document; `None` when every assignment carries
  /// its own dates and state.
  pub universal:         Option<UniversalDates>,
}

impl Document {
  pub fn is_universal(&self) -> bool {
    self.universal.is_some()
  }
}

/// Input to [`crate::store::DocumentStore::insert_document`].
/// The `document_id` is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub code:              String,
  pub name:              String,
  pub validity_days:     u32,
  pub anticipation_days: u32,
  pub universal:         Option<UniversalDates>,
}
