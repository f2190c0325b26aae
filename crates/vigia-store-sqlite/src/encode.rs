//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, date-only values as
//! `YYYY-MM-DD`, UUIDs as hyphenated lowercase strings, and enums as their
//! lowercase code strings.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;
use vigia_core::{
  assignment::{Assignment, AssignmentKind},
  audit::{Actor, AuditKind, AuditLogEntry, RunMode},
  dates::DateTriple,
  document::{Document, UniversalDates},
  state::State,
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<&str>) -> Result<Option<Uuid>> {
  s.map(decode_uuid).transpose()
}

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_audit_kind(k: AuditKind) -> &'static str {
  match k {
    AuditKind::Resource => "resource",
    AuditKind::Entity => "entity",
    AuditKind::Universal => "universal",
  }
}

pub fn decode_audit_kind(s: &str) -> Result<AuditKind> {
  match s {
    "resource" => Ok(AuditKind::Resource),
    "entity" => Ok(AuditKind::Entity),
    "universal" => Ok(AuditKind::Universal),
    other => Err(Error::Decode(format!("unknown audit kind: {other:?}"))),
  }
}

pub fn encode_run_mode(m: RunMode) -> &'static str {
  match m {
    RunMode::Manual => "manual",
    RunMode::Automatic => "automatic",
  }
}

pub fn decode_run_mode(s: &str) -> Result<RunMode> {
  match s {
    "manual" => Ok(RunMode::Manual),
    "automatic" => Ok(RunMode::Automatic),
    other => Err(Error::Decode(format!("unknown run mode: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `states` row.
pub struct RawState {
  pub state_id: String,
  pub code:     String,
  pub name:     String,
  pub level:    i64,
  pub color:    String,
}

impl RawState {
  pub fn into_state(self) -> Result<State> {
    let level = u8::try_from(self.level)
      .map_err(|_| Error::Decode(format!("state level out of range: {}", self.level)))?;

    Ok(State {
      state_id: decode_uuid(&self.state_id)?,
      code:     self.code,
      name:     self.name,
      level,
      color:    self.color,
    })
  }
}

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id:       String,
  pub code:              String,
  pub name:              String,
  pub validity_days:     i64,
  pub anticipation_days: i64,
  pub is_universal:      bool,
  pub emission_date:     Option<String>,
  pub processing_date:   Option<String>,
  pub expiration_date:   Option<String>,
  pub state_id:          Option<String>,
}

impl RawDocument {
  pub fn into_document(self) -> Result<Document> {
    let universal = if self.is_universal {
      Some(UniversalDates {
        dates:    DateTriple {
          emission:   self.emission_date.as_deref().map(decode_date).transpose()?,
          processing: self.processing_date.as_deref().map(decode_date).transpose()?,
          expiration: self.expiration_date.as_deref().map(decode_date).transpose()?,
        },
        state_id: decode_opt_uuid(self.state_id.as_deref())?,
      })
    } else {
      None
    };

    let validity_days = u32::try_from(self.validity_days).map_err(|_| {
      Error::Decode(format!("validity_days out of range: {}", self.validity_days))
    })?;
    let anticipation_days =
      u32::try_from(self.anticipation_days).map_err(|_| {
        Error::Decode(format!(
          "anticipation_days out of range: {}",
          self.anticipation_days
        ))
      })?;

    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      code: self.code,
      name: self.name,
      validity_days,
      anticipation_days,
      universal,
    })
  }
}

/// Raw strings read from one of the two assignment tables; the holder column
/// is aliased to `holder_id` in the SELECT.
pub struct RawAssignment {
  pub assignment_id:   String,
  pub document_id:     String,
  pub holder_id:       String,
  pub emission_date:   Option<String>,
  pub processing_date: Option<String>,
  pub expiration_date: Option<String>,
  pub state_id:        Option<String>,
}

impl RawAssignment {
  pub fn into_assignment(self, kind: AssignmentKind) -> Result<Assignment> {
    Ok(Assignment {
      assignment_id: decode_uuid(&self.assignment_id)?,
      document_id:   decode_uuid(&self.document_id)?,
      holder_id:     decode_uuid(&self.holder_id)?,
      kind,
      dates: DateTriple {
        emission:   self.emission_date.as_deref().map(decode_date).transpose()?,
        processing: self.processing_date.as_deref().map(decode_date).transpose()?,
        expiration: self.expiration_date.as_deref().map(decode_date).transpose()?,
      },
      state_id: decode_opt_uuid(self.state_id.as_deref())?,
    })
  }
}

/// Raw strings read directly from an `audit_log` row.
pub struct RawAuditEntry {
  pub entry_id:          String,
  pub kind:              String,
  pub document_id:       String,
  pub holder_id:         Option<String>,
  pub previous_state_id: Option<String>,
  pub new_state_id:      String,
  pub reason:            String,
  pub actor_user_id:     Option<String>,
  pub mode:              String,
  pub recorded_at:       String,
}

impl RawAuditEntry {
  pub fn into_entry(self) -> Result<AuditLogEntry> {
    let actor = match decode_opt_uuid(self.actor_user_id.as_deref())? {
      Some(id) => Actor::User(id),
      None => Actor::Automatic,
    };

    Ok(AuditLogEntry {
      entry_id:          decode_uuid(&self.entry_id)?,
      kind:              decode_audit_kind(&self.kind)?,
      document_id:       decode_uuid(&self.document_id)?,
      holder_id:         decode_opt_uuid(self.holder_id.as_deref())?,
      previous_state_id: decode_opt_uuid(self.previous_state_id.as_deref())?,
      new_state_id:      decode_uuid(&self.new_state_id)?,
      reason:            self.reason,
      actor,
      mode:              decode_run_mode(&self.mode)?,
      recorded_at:       decode_dt(&self.recorded_at)?,
    })
  }
}
