//! The date model and the assignment date resolver.
//!
//! All lifecycle dates are date-only values ([`NaiveDate`]) — no time-of-day
//! component, no timezone. Calendar-day arithmetic on these cannot drift
//! across timezone boundaries, which is the whole point.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::document::Document;

// ─── DateTriple ──────────────────────────────────────────────────────────────

/// The three lifecycle dates carried by an assignment (or by a universal
/// document directly). Any of them may be unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTriple {
  pub emission:   Option<NaiveDate>,
  pub processing: Option<NaiveDate>,
  pub expiration: Option<NaiveDate>,
}

// ─── EffectiveDates ──────────────────────────────────────────────────────────

/// The resolved dates for one assignment, as the evaluator sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveDates {
  pub emission:   Option<NaiveDate>,
  pub processing: Option<NaiveDate>,
  pub expiration: Option<NaiveDate>,
  /// Whether these dates came from a universal document rather than the
  /// assignment row.
  pub universal:  bool,
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Compute the effective dates for an assignment of `document`.
///
/// For a universal document the document's own dates are authoritative and
/// any caller-supplied `overrides` are ignored. Otherwise the overrides are
/// taken as-is, except that a present emission date with an absent expiration
/// date derives `expiration = emission + validity_days`.
///
/// An absent emission date leaves the expiration absent; such an assignment
/// is skipped by expiration-driven evaluation rather than treated as an
/// error.
pub fn resolve(document: &Document, overrides: Option<&DateTriple>) -> EffectiveDates {
  if let Some(universal) = &document.universal {
    return EffectiveDates {
      emission:   universal.dates.emission,
      processing: universal.dates.processing,
      expiration: universal.dates.expiration,
      universal:  true,
    };
  }

  let dates = overrides.copied().unwrap_or_default();
  let expiration = dates.expiration.or_else(|| {
    dates
      .emission
      .and_then(|e| e.checked_add_days(Days::new(u64::from(document.validity_days))))
  });

  EffectiveDates {
    emission: dates.emission,
    processing: dates.processing,
    expiration,
    universal: false,
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::document::{Document, UniversalDates};

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn plain_document(validity_days: u32) -> Document {
    Document {
      document_id:       Uuid::new_v4(),
      code:              "safety-cert".to_string(),
      name:              "Safety certificate".to_string(),
      validity_days,
      anticipation_days: 30,
      universal:         None,
    }
  }

  fn universal_document(dates: DateTriple) -> Document {
    Document {
      universal: Some(UniversalDates { dates, state_id: None }),
      ..plain_document(365)
    }
  }

  #[test]
  fn derives_expiration_from_emission_and_validity() {
    let doc = plain_document(30);
    let overrides = DateTriple {
      emission: Some(date(2024, 6, 1)),
      ..Default::default()
    };

    let effective = resolve(&doc, Some(&overrides));
    assert_eq!(effective.expiration, Some(date(2024, 7, 1)));
    assert!(!effective.universal);
  }

  #[test]
  fn derives_expiration_across_a_year_boundary() {
    let doc = plain_document(365);
    let overrides = DateTriple {
      emission: Some(date(2023, 1, 1)),
      ..Default::default()
    };

    let effective = resolve(&doc, Some(&overrides));
    assert_eq!(effective.expiration, Some(date(2024, 1, 1)));
  }

  #[test]
  fn explicit_expiration_override_wins() {
    let doc = plain_document(30);
    let overrides = DateTriple {
      emission:   Some(date(2024, 6, 1)),
      processing: None,
      expiration: Some(date(2024, 6, 15)),
    };

    let effective = resolve(&doc, Some(&overrides));
    assert_eq!(effective.expiration, Some(date(2024, 6, 15)));
  }

  #[test]
  fn absent_emission_leaves_expiration_absent() {
    let doc = plain_document(30);
    let effective = resolve(&doc, Some(&DateTriple::default()));
    assert_eq!(effective.expiration, None);
  }

  #[test]
  fn universal_dates_are_verbatim_and_overrides_are_ignored() {
    let doc = universal_document(DateTriple {
      emission:   Some(date(2024, 1, 1)),
      processing: Some(date(2024, 1, 5)),
      expiration: Some(date(2025, 1, 1)),
    });
    let overrides = DateTriple {
      emission:   Some(date(2020, 3, 3)),
      processing: None,
      expiration: Some(date(2020, 4, 4)),
    };

    let effective = resolve(&doc, Some(&overrides));
    assert!(effective.universal);
    assert_eq!(effective.emission, Some(date(2024, 1, 1)));
    assert_eq!(effective.processing, Some(date(2024, 1, 5)));
    assert_eq!(effective.expiration, Some(date(2025, 1, 1)));
  }
}
