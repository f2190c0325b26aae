//! [`SqliteStore`] — the SQLite implementation of [`DocumentStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use vigia_core::{
  assignment::{Assignment, AssignmentKind, Entity, NewAssignment, Resource},
  audit::{AuditFilter, AuditLogEntry, NewAuditEntry},
  dates::DateTriple,
  document::{Document, NewDocument},
  state::{State, StateCatalog},
  store::DocumentStore,
};

use crate::{
  Error, Result,
  encode::{
    RawAssignment, RawAuditEntry, RawDocument, RawState, decode_uuid,
    encode_audit_kind, encode_date, encode_dt, encode_run_mode, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vigia document store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// The assignment table and holder column for a kind.
fn assignment_table(kind: AssignmentKind) -> (&'static str, &'static str) {
  match kind {
    AssignmentKind::Resource => ("resource_assignments", "resource_id"),
    AssignmentKind::Entity => ("entity_assignments", "entity_id"),
  }
}

/// A fully-encoded audit row, ready to insert inside a transaction.
struct EncodedAudit {
  entry_id:          String,
  kind:              &'static str,
  document_id:       String,
  holder_id:         Option<String>,
  previous_state_id: Option<String>,
  new_state_id:      String,
  reason:            String,
  actor_user_id:     Option<String>,
  mode:              &'static str,
  recorded_at:       String,
}

/// Build the persisted entry (ids and timestamp are store-assigned) together
/// with its encoded form.
fn build_audit(input: NewAuditEntry) -> (AuditLogEntry, EncodedAudit) {
  let entry = AuditLogEntry {
    entry_id:          Uuid::new_v4(),
    kind:              input.kind,
    document_id:       input.document_id,
    holder_id:         input.holder_id,
    previous_state_id: input.previous_state_id,
    new_state_id:      input.new_state_id,
    reason:            input.reason,
    actor:             input.actor,
    mode:              input.mode,
    recorded_at:       Utc::now(),
  };

  let encoded = EncodedAudit {
    entry_id:          encode_uuid(entry.entry_id),
    kind:              encode_audit_kind(entry.kind),
    document_id:       encode_uuid(entry.document_id),
    holder_id:         entry.holder_id.map(encode_uuid),
    previous_state_id: entry.previous_state_id.map(encode_uuid),
    new_state_id:      encode_uuid(entry.new_state_id),
    reason:            entry.reason.clone(),
    actor_user_id:     entry.actor.user_id().map(encode_uuid),
    mode:              encode_run_mode(entry.mode),
    recorded_at:       encode_dt(entry.recorded_at),
  };

  (entry, encoded)
}

fn insert_audit_row(
  conn: &rusqlite::Connection,
  row: &EncodedAudit,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO audit_log (
       entry_id, kind, document_id, holder_id,
       previous_state_id, new_state_id, reason,
       actor_user_id, mode, recorded_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    rusqlite::params![
      row.entry_id,
      row.kind,
      row.document_id,
      row.holder_id,
      row.previous_state_id,
      row.new_state_id,
      row.reason,
      row.actor_user_id,
      row.mode,
      row.recorded_at,
    ],
  )?;
  Ok(())
}

// ─── DocumentStore impl ──────────────────────────────────────────────────────

impl DocumentStore for SqliteStore {
  type Error = Error;

  // ── Catalog ───────────────────────────────────────────────────────────────

  async fn insert_state(&self, state: State) -> Result<()> {
    let id_str = encode_uuid(state.state_id);
    let level = i64::from(state.level);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO states (state_id, code, name, level, color)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, state.code, state.name, level, state.color],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn load_catalog(&self) -> Result<StateCatalog> {
    let raws: Vec<RawState> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare("SELECT state_id, code, name, level, color FROM states")?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawState {
              state_id: row.get(0)?,
              code:     row.get(1)?,
              name:     row.get(2)?,
              level:    row.get(3)?,
              color:    row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let states = raws
      .into_iter()
      .map(RawState::into_state)
      .collect::<Result<Vec<_>>>()?;

    Ok(StateCatalog::new(states)?)
  }

  // ── Holders ───────────────────────────────────────────────────────────────

  async fn insert_resource(&self, display_name: String) -> Result<Resource> {
    let resource = Resource {
      resource_id: Uuid::new_v4(),
      display_name,
      active: true,
    };

    let id_str = encode_uuid(resource.resource_id);
    let name = resource.display_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO resources (resource_id, display_name, active) VALUES (?1, ?2, 1)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(resource)
  }

  async fn insert_entity(&self, display_name: String) -> Result<Entity> {
    let entity = Entity {
      entity_id: Uuid::new_v4(),
      display_name,
      active: true,
    };

    let id_str = encode_uuid(entity.entity_id);
    let name = entity.display_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO entities (entity_id, display_name, active) VALUES (?1, ?2, 1)",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(entity)
  }

  async fn set_holder_active(
    &self,
    holder_id: Uuid,
    kind: AssignmentKind,
    active: bool,
  ) -> Result<()> {
    let (table, column) = match kind {
      AssignmentKind::Resource => ("resources", "resource_id"),
      AssignmentKind::Entity => ("entities", "entity_id"),
    };
    let id_str = encode_uuid(holder_id);

    let changed = self
      .conn
      .call(move |conn| {
        let sql = format!("UPDATE {table} SET active = ?2 WHERE {column} = ?1");
        Ok(conn.execute(&sql, rusqlite::params![id_str, active])?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::HolderNotFound(holder_id));
    }
    Ok(())
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn insert_document(&self, input: NewDocument) -> Result<Document> {
    let document = Document {
      document_id:       Uuid::new_v4(),
      code:              input.code,
      name:              input.name,
      validity_days:     input.validity_days,
      anticipation_days: input.anticipation_days,
      universal:         input.universal,
    };

    let id_str = encode_uuid(document.document_id);
    let code = document.code.clone();
    let name = document.name.clone();
    let validity = i64::from(document.validity_days);
    let anticipation = i64::from(document.anticipation_days);
    let is_universal = document.universal.is_some();
    let (emission, processing, expiration, state_id) = match &document.universal {
      Some(u) => (
        u.dates.emission.map(encode_date),
        u.dates.processing.map(encode_date),
        u.dates.expiration.map(encode_date),
        u.state_id.map(encode_uuid),
      ),
      None => (None, None, None, None),
    };

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (
             document_id, code, name, validity_days, anticipation_days,
             is_universal, emission_date, processing_date, expiration_date, state_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            code,
            name,
            validity,
            anticipation,
            is_universal,
            emission,
            processing,
            expiration,
            state_id,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(document)
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT document_id, code, name, validity_days, anticipation_days,
                      is_universal, emission_date, processing_date, expiration_date, state_id
               FROM documents WHERE document_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawDocument {
                  document_id:       row.get(0)?,
                  code:              row.get(1)?,
                  name:              row.get(2)?,
                  validity_days:     row.get(3)?,
                  anticipation_days: row.get(4)?,
                  is_universal:      row.get(5)?,
                  emission_date:     row.get(6)?,
                  processing_date:   row.get(7)?,
                  expiration_date:   row.get(8)?,
                  state_id:          row.get(9)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self) -> Result<Vec<Document>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT document_id, code, name, validity_days, anticipation_days,
                  is_universal, emission_date, processing_date, expiration_date, state_id
           FROM documents ORDER BY code",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDocument {
              document_id:       row.get(0)?,
              code:              row.get(1)?,
              name:              row.get(2)?,
              validity_days:     row.get(3)?,
              anticipation_days: row.get(4)?,
              is_universal:      row.get(5)?,
              emission_date:     row.get(6)?,
              processing_date:   row.get(7)?,
              expiration_date:   row.get(8)?,
              state_id:          row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn insert_assignment(&self, input: NewAssignment) -> Result<Assignment> {
    let assignment = Assignment {
      assignment_id: Uuid::new_v4(),
      document_id:   input.document_id,
      holder_id:     input.holder_id,
      kind:          input.kind,
      dates:         input.dates,
      state_id:      input.state_id,
    };

    let (table, holder_column) = assignment_table(assignment.kind);
    let id_str = encode_uuid(assignment.assignment_id);
    let document_str = encode_uuid(assignment.document_id);
    let holder_str = encode_uuid(assignment.holder_id);
    let emission = assignment.dates.emission.map(encode_date);
    let processing = assignment.dates.processing.map(encode_date);
    let expiration = assignment.dates.expiration.map(encode_date);
    let state_str = assignment.state_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        let sql = format!(
          "INSERT INTO {table} (
             assignment_id, document_id, {holder_column},
             emission_date, processing_date, expiration_date, state_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
        );
        conn.execute(
          &sql,
          rusqlite::params![
            id_str,
            document_str,
            holder_str,
            emission,
            processing,
            expiration,
            state_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(assignment)
  }

  async fn list_assignments(
    &self,
    document_id: Option<Uuid>,
    kind: Option<AssignmentKind>,
  ) -> Result<Vec<Assignment>> {
    let kinds = match kind {
      Some(k) => vec![k],
      None => vec![AssignmentKind::Resource, AssignmentKind::Entity],
    };

    let mut assignments = Vec::new();
    for k in kinds {
      let (table, holder_column) = assignment_table(k);
      let document_str = document_id.map(encode_uuid);

      let raws: Vec<RawAssignment> = self
        .conn
        .call(move |conn| {
          let sql = format!(
            "SELECT assignment_id, document_id, {holder_column} AS holder_id,
                    emission_date, processing_date, expiration_date, state_id
             FROM {table}
             WHERE (?1 IS NULL OR document_id = ?1)
             ORDER BY assignment_id"
          );
          let mut stmt = conn.prepare(&sql)?;
          let rows = stmt
            .query_map(rusqlite::params![document_str], |row| {
              Ok(RawAssignment {
                assignment_id:   row.get(0)?,
                document_id:     row.get(1)?,
                holder_id:       row.get(2)?,
                emission_date:   row.get(3)?,
                processing_date: row.get(4)?,
                expiration_date: row.get(5)?,
                state_id:        row.get(6)?,
              })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

      for raw in raws {
        assignments.push(raw.into_assignment(k)?);
      }
    }

    Ok(assignments)
  }

  async fn set_assignment_dates(
    &self,
    assignment_id: Uuid,
    kind: AssignmentKind,
    dates: DateTriple,
  ) -> Result<()> {
    let (table, _) = assignment_table(kind);
    let id_str = encode_uuid(assignment_id);
    let emission = dates.emission.map(encode_date);
    let processing = dates.processing.map(encode_date);
    let expiration = dates.expiration.map(encode_date);

    let changed = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "UPDATE {table}
           SET emission_date = ?2, processing_date = ?3, expiration_date = ?4
           WHERE assignment_id = ?1"
        );
        Ok(conn.execute(
          &sql,
          rusqlite::params![id_str, emission, processing, expiration],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AssignmentNotFound(assignment_id));
    }
    Ok(())
  }

  // ── Transitions ───────────────────────────────────────────────────────────

  async fn apply_assignment_transition(
    &self,
    assignment_id: Uuid,
    kind: AssignmentKind,
    new_state_id: Uuid,
    audit: NewAuditEntry,
  ) -> Result<AuditLogEntry> {
    let (table, _) = assignment_table(kind);
    let (entry, encoded) = build_audit(audit);
    let id_str = encode_uuid(assignment_id);
    let state_str = encode_uuid(new_state_id);

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let sql =
          format!("UPDATE {table} SET state_id = ?2 WHERE assignment_id = ?1");
        let changed = tx.execute(&sql, rusqlite::params![id_str, state_str])?;
        if changed == 1 {
          insert_audit_row(&tx, &encoded)?;
          tx.commit()?;
        }
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::AssignmentNotFound(assignment_id));
    }
    Ok(entry)
  }

  async fn apply_document_transition(
    &self,
    document_id: Uuid,
    new_state_id: Uuid,
    audit: NewAuditEntry,
  ) -> Result<AuditLogEntry> {
    let (entry, encoded) = build_audit(audit);
    let id_str = encode_uuid(document_id);
    let state_str = encode_uuid(new_state_id);

    let changed = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE documents SET state_id = ?2
           WHERE document_id = ?1 AND is_universal = 1",
          rusqlite::params![id_str, state_str],
        )?;
        if changed == 1 {
          insert_audit_row(&tx, &encoded)?;
          tx.commit()?;
        }
        Ok(changed)
      })
      .await?;

    if changed == 0 {
      return Err(Error::DocumentNotFound(document_id));
    }
    Ok(entry)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn assignment_states(&self, document_id: Uuid) -> Result<Vec<Uuid>> {
    let document_str = encode_uuid(document_id);

    let raw_ids: Vec<String> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT ra.state_id
           FROM resource_assignments ra
           JOIN resources r ON r.resource_id = ra.resource_id
           WHERE ra.document_id = ?1 AND r.active = 1 AND ra.state_id IS NOT NULL
           UNION ALL
           SELECT ea.state_id
           FROM entity_assignments ea
           JOIN entities e ON e.entity_id = ea.entity_id
           WHERE ea.document_id = ?1 AND e.active = 1 AND ea.state_id IS NOT NULL",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![document_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raw_ids.iter().map(|s| decode_uuid(s)).collect()
  }

  async fn get_audit_log(&self, filter: &AuditFilter) -> Result<Vec<AuditLogEntry>> {
    let document_str = filter.document_id.map(encode_uuid);
    let holder_str = filter.holder_id.map(encode_uuid);
    let kind_str = filter.kind.map(encode_audit_kind);
    let actor_str = filter.actor_user_id.map(encode_uuid);
    let after_str = filter.recorded_after.map(encode_dt);
    let before_str = filter.recorded_before.map(encode_dt);
    let limit_val = filter.limit.map(|l| l as i64).unwrap_or(-1);
    let offset_val = filter.offset.unwrap_or(0) as i64;

    let raws: Vec<RawAuditEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT entry_id, kind, document_id, holder_id,
                  previous_state_id, new_state_id, reason,
                  actor_user_id, mode, recorded_at
           FROM audit_log
           WHERE (?1 IS NULL OR document_id = ?1)
             AND (?2 IS NULL OR holder_id = ?2)
             AND (?3 IS NULL OR kind = ?3)
             AND (?4 IS NULL OR actor_user_id = ?4)
             AND (?5 IS NULL OR recorded_at >= ?5)
             AND (?6 IS NULL OR recorded_at <= ?6)
           ORDER BY recorded_at, entry_id
           LIMIT ?7 OFFSET ?8",
        )?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              document_str,
              holder_str,
              kind_str,
              actor_str,
              after_str,
              before_str,
              limit_val,
              offset_val,
            ],
            |row| {
              Ok(RawAuditEntry {
                entry_id:          row.get(0)?,
                kind:              row.get(1)?,
                document_id:       row.get(2)?,
                holder_id:         row.get(3)?,
                previous_state_id: row.get(4)?,
                new_state_id:      row.get(5)?,
                reason:            row.get(6)?,
                actor_user_id:     row.get(7)?,
                mode:              row.get(8)?,
                recorded_at:       row.get(9)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
