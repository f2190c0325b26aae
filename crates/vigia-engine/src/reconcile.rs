//! The reconciliation service.
//!
//! A run walks every universal document and every assignment, asks the
//! evaluator for a target state, and persists each decided transition in its
//! own local transaction paired with one audit entry. A failure on one row is
//! counted and logged, never propagated — the evaluator is idempotent, so the
//! next run self-corrects whatever this one missed. The deliberate trade is
//! forward progress over all-or-nothing consistency.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use vigia_core::{
  Error as CoreError,
  aggregate::aggregate,
  assignment::Assignment,
  audit::{Actor, AuditKind, AuditLogEntry, NewAuditEntry, RunMode},
  dates::resolve,
  document::Document,
  evaluate::{Transition, evaluate},
  state::{State, StateCatalog, StateCode},
  store::DocumentStore,
};

use crate::error::{Error, Result};

// ─── Summary types ───────────────────────────────────────────────────────────

/// One persisted state change, as reported in the run summary.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeDetail {
  pub kind:              AuditKind,
  pub document_id:       Uuid,
  pub holder_id:         Option<Uuid>,
  pub previous_state_id: Option<Uuid>,
  pub new_state_id:      Uuid,
  pub reason:            String,
}

/// The outcome of one reconciliation run. Manual and automatic runs report
/// the identical shape so operators can confirm effect either way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
  /// Rows visited, including no-ops and rows skipped for missing dates.
  pub total_reviewed: usize,
  pub updated:        usize,
  pub errors:         usize,
  pub changes:        Vec<ChangeDetail>,
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// The write-side engine: evaluates and persists document lifecycle states.
///
/// Holds an explicitly constructed catalog; nothing here reads global state,
/// and `run_at` takes "today" as a parameter, so runs are deterministic under
/// test.
pub struct Reconciler<S> {
  store:   Arc<S>,
  catalog: StateCatalog,
}

impl<S: DocumentStore> Reconciler<S> {
  pub fn new(store: Arc<S>, catalog: StateCatalog) -> Self {
    Self { store, catalog }
  }

  pub fn catalog(&self) -> &StateCatalog {
    &self.catalog
  }

  /// Reconcile against the current local date.
  pub async fn run(
    &self,
    actor: Option<Uuid>,
    mode: RunMode,
  ) -> Result<RunSummary, S::Error> {
    self.run_at(Local::now().date_naive(), actor, mode).await
  }

  /// Reconcile against an explicit "today" — the deterministic entry point.
  pub async fn run_at(
    &self,
    today: NaiveDate,
    actor: Option<Uuid>,
    mode: RunMode,
  ) -> Result<RunSummary, S::Error> {
    // A catalog missing the codes the engine asserts is a broken deployment.
    // Abort before touching any row.
    self.catalog.require(StateCode::Current)?;
    self.catalog.require(StateCode::AboutToExpire)?;
    self.catalog.require(StateCode::Expired)?;

    let actor = actor.map(Actor::User).unwrap_or(Actor::Automatic);
    let mut summary = RunSummary::default();

    let documents = self.store.list_documents().await.map_err(Error::Store)?;
    for document in &documents {
      if let Some(universal) = &document.universal {
        summary.total_reviewed += 1;

        let decision = evaluate(
          today,
          universal.dates.expiration,
          document.anticipation_days,
          universal.state_id,
          &self.catalog,
        )?;
        if let Some(transition) = decision {
          self
            .persist_universal(document, universal.state_id, transition, actor, mode, &mut summary)
            .await;
        }
      } else {
        let assignments = self
          .store
          .list_assignments(Some(document.document_id), None)
          .await
          .map_err(Error::Store)?;

        for assignment in &assignments {
          summary.total_reviewed += 1;

          let effective = resolve(document, Some(&assignment.dates));
          let decision = evaluate(
            today,
            effective.expiration,
            document.anticipation_days,
            assignment.state_id,
            &self.catalog,
          )?;
          if let Some(transition) = decision {
            self
              .persist_assignment(document, assignment, transition, actor, mode, &mut summary)
              .await;
          }
        }
      }
    }

    tracing::debug!(
      total = summary.total_reviewed,
      updated = summary.updated,
      errors = summary.errors,
      "reconciliation pass finished"
    );
    Ok(summary)
  }

  async fn persist_universal(
    &self,
    document: &Document,
    previous_state_id: Option<Uuid>,
    transition: Transition,
    actor: Actor,
    mode: RunMode,
    summary: &mut RunSummary,
  ) {
    let audit = NewAuditEntry {
      kind: AuditKind::Universal,
      document_id: document.document_id,
      holder_id: None,
      previous_state_id,
      new_state_id: transition.target_state_id,
      reason: transition.reason.clone(),
      actor,
      mode,
    };

    let result = self
      .store
      .apply_document_transition(document.document_id, transition.target_state_id, audit)
      .await;

    Self::record_outcome(
      result,
      ChangeDetail {
        kind: AuditKind::Universal,
        document_id: document.document_id,
        holder_id: None,
        previous_state_id,
        new_state_id: transition.target_state_id,
        reason: transition.reason,
      },
      summary,
    );
  }

  async fn persist_assignment(
    &self,
    document: &Document,
    assignment: &Assignment,
    transition: Transition,
    actor: Actor,
    mode: RunMode,
    summary: &mut RunSummary,
  ) {
    let kind = AuditKind::from(assignment.kind);
    let audit = NewAuditEntry {
      kind,
      document_id: document.document_id,
      holder_id: Some(assignment.holder_id),
      previous_state_id: assignment.state_id,
      new_state_id: transition.target_state_id,
      reason: transition.reason.clone(),
      actor,
      mode,
    };

    let result = self
      .store
      .apply_assignment_transition(
        assignment.assignment_id,
        assignment.kind,
        transition.target_state_id,
        audit,
      )
      .await;

    Self::record_outcome(
      result,
      ChangeDetail {
        kind,
        document_id: document.document_id,
        holder_id: Some(assignment.holder_id),
        previous_state_id: assignment.state_id,
        new_state_id: transition.target_state_id,
        reason: transition.reason,
      },
      summary,
    );
  }

  /// Fold one row's persistence outcome into the summary. Failures are
  /// logged and counted; they never abort the run.
  fn record_outcome(
    result: std::result::Result<AuditLogEntry, S::Error>,
    change: ChangeDetail,
    summary: &mut RunSummary,
  ) {
    match result {
      Ok(_) => {
        summary.updated += 1;
        summary.changes.push(change);
      }
      Err(error) => {
        summary.errors += 1;
        tracing::warn!(
          document_id = %change.document_id,
          error = %error,
          "failed to persist state transition, continuing"
        );
      }
    }
  }

  // ── Administrative overrides ──────────────────────────────────────────────

  /// Set an assignment's state by operator decision, bypassing the evaluator.
  /// Pairs the write with a manual-mode audit entry like any other mutation.
  pub async fn override_assignment_state(
    &self,
    assignment: &Assignment,
    new_state_id: Uuid,
    actor_user_id: Uuid,
    reason: String,
  ) -> Result<AuditLogEntry, S::Error> {
    if self.catalog.by_id(new_state_id).is_none() {
      return Err(CoreError::UnknownState(new_state_id).into());
    }

    let audit = NewAuditEntry {
      kind: AuditKind::from(assignment.kind),
      document_id: assignment.document_id,
      holder_id: Some(assignment.holder_id),
      previous_state_id: assignment.state_id,
      new_state_id,
      reason,
      actor: Actor::User(actor_user_id),
      mode: RunMode::Manual,
    };

    self
      .store
      .apply_assignment_transition(assignment.assignment_id, assignment.kind, new_state_id, audit)
      .await
      .map_err(Error::Store)
  }

  /// Set a universal document's state by operator decision.
  pub async fn override_document_state(
    &self,
    document: &Document,
    new_state_id: Uuid,
    actor_user_id: Uuid,
    reason: String,
  ) -> Result<AuditLogEntry, S::Error> {
    if self.catalog.by_id(new_state_id).is_none() {
      return Err(CoreError::UnknownState(new_state_id).into());
    }
    let previous = document.universal.as_ref().and_then(|u| u.state_id);

    let audit = NewAuditEntry {
      kind: AuditKind::Universal,
      document_id: document.document_id,
      holder_id: None,
      previous_state_id: previous,
      new_state_id,
      reason,
      actor: Actor::User(actor_user_id),
      mode: RunMode::Manual,
    };

    self
      .store
      .apply_document_transition(document.document_id, new_state_id, audit)
      .await
      .map_err(Error::Store)
  }

  // ── Read side ─────────────────────────────────────────────────────────────

  /// The critical state of a document: its own state if universal, else the
  /// severity-maximal state over its live assignments. Reads only committed
  /// values; runs freely alongside an in-progress reconciliation.
  pub async fn critical_state(&self, document_id: Uuid) -> Result<State, S::Error> {
    let document = self
      .store
      .get_document(document_id)
      .await
      .map_err(Error::Store)?
      .ok_or(CoreError::DocumentNotFound(document_id))?;

    if let Some(universal) = &document.universal {
      let state = match universal.state_id {
        Some(id) => self
          .catalog
          .by_id(id)
          .ok_or(CoreError::UnknownState(id))?
          .clone(),
        None => State::unassigned(),
      };
      return Ok(state);
    }

    let state_ids = self
      .store
      .assignment_states(document_id)
      .await
      .map_err(Error::Store)?;

    let mut states = Vec::with_capacity(state_ids.len());
    for id in state_ids {
      states.push(self.catalog.by_id(id).ok_or(CoreError::UnknownState(id))?);
    }
    Ok(aggregate(states))
  }
}
