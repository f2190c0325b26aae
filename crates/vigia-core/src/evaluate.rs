//! The state evaluator — the pure date-to-state decision rule.
//!
//! Given today's date, an assignment's resolved expiration date and the
//! document's anticipation window, decide which state (if any) the row must
//! transition to. The evaluator never performs I/O; persistence and audit
//! writes belong to the reconciliation service.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  Result,
  state::{StateCatalog, StateCode},
};

/// A decided transition: the state to assert and the human-readable reason
/// recorded in the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub target_state_id: Uuid,
  pub reason:          String,
}

/// Decide the target state for one row.
///
/// Returns `Ok(None)` when nothing must change: no expiration date is
/// resolvable, the row is already in the target state, or the row sits in an
/// administratively-set state outside the engine's authority.
///
/// The engine asserts exactly three states. `expired` once the expiration
/// date is today or past, `about_to_expire` inside the anticipation window,
/// and — when an expiration date has been pushed back out beyond the window —
/// `current`, but only over a state the engine itself asserted. A row left
/// at `in_process` (or any other administrative state) is never touched.
///
/// Missing `expired`/`about_to_expire`/`current` catalog rows surface as
/// [`Error::MissingStateCode`](crate::Error::MissingStateCode); the caller
/// must abort the whole run on that.
pub fn evaluate(
  today: NaiveDate,
  expiration: Option<NaiveDate>,
  anticipation_days: u32,
  current_state_id: Option<Uuid>,
  catalog: &StateCatalog,
) -> Result<Option<Transition>> {
  let Some(expiration) = expiration else {
    return Ok(None);
  };

  let days_until = (expiration - today).num_days();

  let (target, reason) = if days_until <= 0 {
    let reason = if days_until == 0 {
      "expires today".to_string()
    } else {
      format!("expired {} days ago", -days_until)
    };
    (catalog.require(StateCode::Expired)?, reason)
  } else if days_until <= i64::from(anticipation_days) {
    (
      catalog.require(StateCode::AboutToExpire)?,
      format!("expires in {days_until} days"),
    )
  } else {
    // Past the anticipation window. Pull the row back to `current` only if
    // its state is one this engine asserted; administrative states stay.
    let engine_asserted = current_state_id
      .and_then(|id| catalog.by_id(id))
      .is_some_and(|s| {
        s.code == StateCode::Expired.as_str()
          || s.code == StateCode::AboutToExpire.as_str()
      });
    if !engine_asserted {
      return Ok(None);
    }
    (
      catalog.require(StateCode::Current)?,
      format!(
        "expiration moved to {days_until} days out, beyond the \
         {anticipation_days}-day anticipation window"
      ),
    )
  };

  // Redundant writes (and audit spam) are avoided here, which is also what
  // makes reconciliation idempotent.
  if Some(target.state_id) == current_state_id {
    return Ok(None);
  }

  Ok(Some(Transition {
    target_state_id: target.state_id,
    reason,
  }))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
