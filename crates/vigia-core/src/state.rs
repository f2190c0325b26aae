//! The state catalog — the fixed set of document lifecycle states.
//!
//! States are immutable catalog rows ordered by a severity level (higher is
//! more urgent). The catalog is an explicitly constructed value, never a
//! global; this is what makes reconciliation runs testable with a fixed
//! catalog and a fixed "today".

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── State codes ─────────────────────────────────────────────────────────────

/// The stable codes the engine itself understands.
///
/// The catalog may carry additional administratively-managed states; the
/// engine only ever asserts [`Expired`](StateCode::Expired),
/// [`AboutToExpire`](StateCode::AboutToExpire) and
/// [`Current`](StateCode::Current).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateCode {
  Current,
  AboutToExpire,
  Expired,
  InProcess,
}

impl StateCode {
  /// The string form stored in the `code` column of the catalog.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Current => "current",
      Self::AboutToExpire => "about_to_expire",
      Self::Expired => "expired",
      Self::InProcess => "in_process",
    }
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// One immutable catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
  pub state_id: Uuid,
  /// Stable lookup code, unique within the catalog.
  pub code:     String,
  /// Human-readable display name.
  pub name:     String,
  /// Severity level; total order, higher = more urgent.
  pub level:    u8,
  /// Display colour as a hex string.
  pub color:    String,
}

impl State {
  /// The "no assignments" sentinel returned by the aggregator for an empty
  /// input. Never stored; its nil UUID cannot collide with a catalog row.
  pub fn unassigned() -> Self {
    Self {
      state_id: Uuid::nil(),
      code:     "unassigned".to_string(),
      name:     "No assignments".to_string(),
      level:    1,
      color:    "#9e9e9e".to_string(),
    }
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// An explicitly constructed, immutable lookup over the state rows.
#[derive(Debug, Clone)]
pub struct StateCatalog {
  states: Vec<State>,
}

impl StateCatalog {
  /// Build a catalog, rejecting duplicate codes — each code must resolve to
  /// exactly one row.
  pub fn new(states: Vec<State>) -> Result<Self> {
    for (i, state) in states.iter().enumerate() {
      if states[..i].iter().any(|s| s.code == state.code) {
        return Err(Error::DuplicateStateCode(state.code.clone()));
      }
    }
    Ok(Self { states })
  }

  pub fn by_id(&self, id: Uuid) -> Option<&State> {
    self.states.iter().find(|s| s.state_id == id)
  }

  pub fn by_code(&self, code: &str) -> Option<&State> {
    self.states.iter().find(|s| s.code == code)
  }

  /// Look up a code the engine cannot operate without.
  pub fn require(&self, code: StateCode) -> Result<&State> {
    self
      .by_code(code.as_str())
      .ok_or(Error::MissingStateCode(code.as_str()))
  }

  pub fn states(&self) -> &[State] {
    &self.states
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
