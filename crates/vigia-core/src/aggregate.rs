//! The critical-state aggregator.
//!
//! Reduces a set of per-assignment states to the one severity-maximal state
//! used for per-document rollups and ad hoc reporting.

use crate::state::State;

/// Return the severity-maximal state, ties broken by first-encountered.
/// An empty input yields the [`State::unassigned`] sentinel.
pub fn aggregate<'a, I>(states: I) -> State
where
  I: IntoIterator<Item = &'a State>,
{
  let mut max: Option<&State> = None;
  for state in states {
    // Strict comparison keeps the first-encountered winner on ties.
    match max {
      Some(current) if state.level > current.level => max = Some(state),
      None => max = Some(state),
      _ => {}
    }
  }
  max.cloned().unwrap_or_else(State::unassigned)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn row(code: &str, level: u8) -> State {
    State {
      state_id: Uuid::new_v4(),
      code:     code.to_string(),
      name:     code.to_string(),
      level,
      color:    "#000000".to_string(),
    }
  }

  #[test]
  fn picks_the_severity_maximal_state() {
    let states = vec![
      row("current", 1),
      row("expired", 10),
      row("about_to_expire", 5),
    ];

    let critical = aggregate(&states);
    assert_eq!(critical.code, "expired");
  }

  #[test]
  fn empty_input_yields_the_sentinel() {
    let critical = aggregate(&[]);
    assert_eq!(critical, State::unassigned());
  }

  #[test]
  fn ties_break_on_first_encountered() {
    let first = row("expired", 10);
    let second = row("also-level-ten", 10);
    let states = vec![first.clone(), second];

    let critical = aggregate(&states);
    assert_eq!(critical.state_id, first.state_id);
  }

  #[test]
  fn single_state_is_returned_as_is() {
    let only = row("in_process", 3);
    let critical = aggregate(std::iter::once(&only));
    assert_eq!(critical, only);
  }
}
