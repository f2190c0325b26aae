//! Integration tests for `SqliteStore` against an in-memory database.

use uuid::Uuid;
use vigia_core::{
  assignment::{AssignmentKind, NewAssignment},
  audit::{Actor, AuditFilter, AuditKind, NewAuditEntry, RunMode},
  dates::DateTriple,
  document::{NewDocument, UniversalDates},
  state::{State, StateCatalog, StateCode},
  store::DocumentStore,
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn state(code: &str, level: u8) -> State {
  State {
    state_id: Uuid::new_v4(),
    code:     code.to_string(),
    name:     code.to_string(),
    level,
    color:    "#000000".to_string(),
  }
}

async fn seed_catalog(s: &SqliteStore) -> StateCatalog {
  for st in [
    state("current", 1),
    state("in_process", 3),
    state("about_to_expire", 5),
    state("expired", 10),
  ] {
    s.insert_state(st).await.unwrap();
  }
  s.load_catalog().await.unwrap()
}

fn date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
  chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn plain_document(code: &str) -> NewDocument {
  NewDocument {
    code:              code.to_string(),
    name:              code.to_string(),
    validity_days:     30,
    anticipation_days: 7,
    universal:         None,
  }
}

fn audit_input(document_id: Uuid, holder_id: Option<Uuid>, new_state_id: Uuid) -> NewAuditEntry {
  NewAuditEntry {
    kind: if holder_id.is_some() {
      AuditKind::Resource
    } else {
      AuditKind::Universal
    },
    document_id,
    holder_id,
    previous_state_id: None,
    new_state_id,
    reason: "expires in 3 days".to_string(),
    actor: Actor::Automatic,
    mode: RunMode::Automatic,
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn catalog_roundtrip() {
  let s = store().await;
  let catalog = seed_catalog(&s).await;

  assert_eq!(catalog.states().len(), 4);
  let expired = catalog.require(StateCode::Expired).unwrap();
  assert_eq!(expired.level, 10);
  assert_eq!(catalog.by_id(expired.state_id).unwrap().code, "expired");
}

// ─── Documents ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn document_roundtrip() {
  let s = store().await;

  let doc = s.insert_document(plain_document("safety-cert")).await.unwrap();
  let fetched = s.get_document(doc.document_id).await.unwrap().unwrap();

  assert_eq!(fetched, doc);
  assert!(!fetched.is_universal());
}

#[tokio::test]
async fn universal_document_roundtrip() {
  let s = store().await;
  let catalog = seed_catalog(&s).await;
  let current = catalog.require(StateCode::Current).unwrap().state_id;

  let input = NewDocument {
    universal: Some(UniversalDates {
      dates:    DateTriple {
        emission:   Some(date(2024, 1, 1)),
        processing: None,
        expiration: Some(date(2025, 1, 1)),
      },
      state_id: Some(current),
    }),
    ..plain_document("company-licence")
  };

  let doc = s.insert_document(input).await.unwrap();
  let fetched = s.get_document(doc.document_id).await.unwrap().unwrap();

  assert!(fetched.is_universal());
  let universal = fetched.universal.unwrap();
  assert_eq!(universal.dates.emission, Some(date(2024, 1, 1)));
  assert_eq!(universal.dates.expiration, Some(date(2025, 1, 1)));
  assert_eq!(universal.state_id, Some(current));
}

#[tokio::test]
async fn get_document_missing_returns_none() {
  let s = store().await;
  assert!(s.get_document(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_assignments_filters_by_document_and_kind() {
  let s = store().await;

  let doc_a = s.insert_document(plain_document("a")).await.unwrap();
  let doc_b = s.insert_document(plain_document("b")).await.unwrap();
  let alice = s.insert_resource("Alice".to_string()).await.unwrap();
  let acme = s.insert_entity("Acme".to_string()).await.unwrap();

  for (doc, holder, kind) in [
    (&doc_a, alice.resource_id, AssignmentKind::Resource),
    (&doc_a, acme.entity_id, AssignmentKind::Entity),
    (&doc_b, alice.resource_id, AssignmentKind::Resource),
  ] {
    s.insert_assignment(NewAssignment {
      document_id: doc.document_id,
      holder_id:   holder,
      kind,
      dates:       DateTriple::default(),
      state_id:    None,
    })
    .await
    .unwrap();
  }

  let all = s.list_assignments(None, None).await.unwrap();
  assert_eq!(all.len(), 3);

  let for_a = s.list_assignments(Some(doc_a.document_id), None).await.unwrap();
  assert_eq!(for_a.len(), 2);

  let entities = s
    .list_assignments(Some(doc_a.document_id), Some(AssignmentKind::Entity))
    .await
    .unwrap();
  assert_eq!(entities.len(), 1);
  assert_eq!(entities[0].holder_id, acme.entity_id);
}

#[tokio::test]
async fn set_assignment_dates_roundtrip() {
  let s = store().await;

  let doc = s.insert_document(plain_document("a")).await.unwrap();
  let alice = s.insert_resource("Alice".to_string()).await.unwrap();
  let assignment = s
    .insert_assignment(NewAssignment {
      document_id: doc.document_id,
      holder_id:   alice.resource_id,
      kind:        AssignmentKind::Resource,
      dates:       DateTriple::default(),
      state_id:    None,
    })
    .await
    .unwrap();

  let dates = DateTriple {
    emission:   Some(date(2024, 6, 1)),
    processing: Some(date(2024, 6, 3)),
    expiration: Some(date(2024, 7, 1)),
  };
  s.set_assignment_dates(assignment.assignment_id, AssignmentKind::Resource, dates)
    .await
    .unwrap();

  let fetched = s
    .list_assignments(Some(doc.document_id), None)
    .await
    .unwrap();
  assert_eq!(fetched[0].dates, dates);
}

#[tokio::test]
async fn set_assignment_dates_missing_errors() {
  let s = store().await;
  let err = s
    .set_assignment_dates(Uuid::new_v4(), AssignmentKind::Resource, DateTriple::default())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AssignmentNotFound(_)));
}

// ─── Transitions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn assignment_transition_writes_state_and_one_audit_entry() {
  let s = store().await;
  let catalog = seed_catalog(&s).await;
  let expired = catalog.require(StateCode::Expired).unwrap().state_id;

  let doc = s.insert_document(plain_document("a")).await.unwrap();
  let alice = s.insert_resource("Alice".to_string()).await.unwrap();
  let assignment = s
    .insert_assignment(NewAssignment {
      document_id: doc.document_id,
      holder_id:   alice.resource_id,
      kind:        AssignmentKind::Resource,
      dates:       DateTriple::default(),
      state_id:    None,
    })
    .await
    .unwrap();

  let entry = s
    .apply_assignment_transition(
      assignment.assignment_id,
      AssignmentKind::Resource,
      expired,
      audit_input(doc.document_id, Some(alice.resource_id), expired),
    )
    .await
    .unwrap();

  assert_eq!(entry.new_state_id, expired);
  assert_eq!(entry.previous_state_id, None);

  let fetched = s
    .list_assignments(Some(doc.document_id), None)
    .await
    .unwrap();
  assert_eq!(fetched[0].state_id, Some(expired));

  let log = s.get_audit_log(&AuditFilter::default()).await.unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0], entry);
}

#[tokio::test]
async fn assignment_transition_missing_row_leaves_no_audit_entry() {
  let s = store().await;
  let catalog = seed_catalog(&s).await;
  let expired = catalog.require(StateCode::Expired).unwrap().state_id;
  let doc = s.insert_document(plain_document("a")).await.unwrap();

  let err = s
    .apply_assignment_transition(
      Uuid::new_v4(),
      AssignmentKind::Resource,
      expired,
      audit_input(doc.document_id, Some(Uuid::new_v4()), expired),
    )
    .await
    .unwrap_err();

  assert!(matches!(err, Error::AssignmentNotFound(_)));
  let log = s.get_audit_log(&AuditFilter::default()).await.unwrap();
  assert!(log.is_empty());
}

#[tokio::test]
async fn document_transition_requires_a_universal_document() {
  let s = store().await;
  let catalog = seed_catalog(&s).await;
  let expired = catalog.require(StateCode::Expired).unwrap().state_id;

  let plain = s.insert_document(plain_document("a")).await.unwrap();
  let err = s
    .apply_document_transition(
      plain.document_id,
      expired,
      audit_input(plain.document_id, None, expired),
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DocumentNotFound(_)));

  let universal = s
    .insert_document(NewDocument {
      universal: Some(UniversalDates {
        dates:    DateTriple::default(),
        state_id: None,
      }),
      ..plain_document("b")
    })
    .await
    .unwrap();

  s.apply_document_transition(
    universal.document_id,
    expired,
    audit_input(universal.document_id, None, expired),
  )
  .await
  .unwrap();

  let fetched = s.get_document(universal.document_id).await.unwrap().unwrap();
  assert_eq!(fetched.universal.unwrap().state_id, Some(expired));
}

// ─── Rollup reads ────────────────────────────────────────────────────────────

#[tokio::test]
async fn assignment_states_skips_stateless_rows_and_inactive_holders() {
  let s = store().await;
  let catalog = seed_catalog(&s).await;
  let expired = catalog.require(StateCode::Expired).unwrap().state_id;
  let current = catalog.require(StateCode::Current).unwrap().state_id;

  let doc = s.insert_document(plain_document("a")).await.unwrap();
  let alice = s.insert_resource("Alice".to_string()).await.unwrap();
  let bob = s.insert_resource("Bob".to_string()).await.unwrap();
  let carol = s.insert_resource("Carol".to_string()).await.unwrap();

  for (holder, state_id) in [
    (alice.resource_id, Some(expired)),
    (bob.resource_id, Some(current)),
    (carol.resource_id, None),
  ] {
    s.insert_assignment(NewAssignment {
      document_id: doc.document_id,
      holder_id:   holder,
      kind:        AssignmentKind::Resource,
      dates:       DateTriple::default(),
      state_id,
    })
    .await
    .unwrap();
  }

  // Bob leaves; his assignment drops out of the rollup.
  s.set_holder_active(bob.resource_id, AssignmentKind::Resource, false)
    .await
    .unwrap();

  let states = s.assignment_states(doc.document_id).await.unwrap();
  assert_eq!(states, vec![expired]);
}

#[tokio::test]
async fn set_holder_active_missing_errors() {
  let s = store().await;
  let err = s
    .set_holder_active(Uuid::new_v4(), AssignmentKind::Entity, false)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::HolderNotFound(_)));
}

// ─── Audit queries ───────────────────────────────────────────────────────────

#[tokio::test]
async fn audit_log_filters_and_pagination() {
  let s = store().await;
  let catalog = seed_catalog(&s).await;
  let expired = catalog.require(StateCode::Expired).unwrap().state_id;

  let doc_a = s.insert_document(plain_document("a")).await.unwrap();
  let doc_b = s.insert_document(NewDocument {
    universal: Some(UniversalDates {
      dates:    DateTriple::default(),
      state_id: None,
    }),
    ..plain_document("b")
  })
  .await
  .unwrap();
  let alice = s.insert_resource("Alice".to_string()).await.unwrap();
  let operator = Uuid::new_v4();

  let assignment = s
    .insert_assignment(NewAssignment {
      document_id: doc_a.document_id,
      holder_id:   alice.resource_id,
      kind:        AssignmentKind::Resource,
      dates:       DateTriple::default(),
      state_id:    None,
    })
    .await
    .unwrap();

  s.apply_assignment_transition(
    assignment.assignment_id,
    AssignmentKind::Resource,
    expired,
    NewAuditEntry {
      actor: Actor::User(operator),
      mode: RunMode::Manual,
      ..audit_input(doc_a.document_id, Some(alice.resource_id), expired)
    },
  )
  .await
  .unwrap();

  s.apply_document_transition(
    doc_b.document_id,
    expired,
    audit_input(doc_b.document_id, None, expired),
  )
  .await
  .unwrap();

  let all = s.get_audit_log(&AuditFilter::default()).await.unwrap();
  assert_eq!(all.len(), 2);

  let for_doc_a = s
    .get_audit_log(&AuditFilter {
      document_id: Some(doc_a.document_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(for_doc_a.len(), 1);
  assert_eq!(for_doc_a[0].holder_id, Some(alice.resource_id));

  let by_operator = s
    .get_audit_log(&AuditFilter {
      actor_user_id: Some(operator),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_operator.len(), 1);
  assert_eq!(by_operator[0].mode, RunMode::Manual);

  let universal_only = s
    .get_audit_log(&AuditFilter {
      kind: Some(AuditKind::Universal),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(universal_only.len(), 1);
  assert_eq!(universal_only[0].document_id, doc_b.document_id);

  let paged = s
    .get_audit_log(&AuditFilter {
      limit: Some(1),
      offset: Some(1),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(paged.len(), 1);
}

#[tokio::test]
async fn corrupt_rows_decode_to_decode_errors_not_truncated_values() {
  use crate::encode::{RawDocument, RawState, decode_audit_kind, decode_run_mode};

  let raw = RawState {
    state_id: Uuid::new_v4().to_string(),
    code:     "expired".to_string(),
    name:     "expired".to_string(),
    level:    300,
    color:    "#000000".to_string(),
  };
  assert!(matches!(raw.into_state(), Err(Error::Decode(_))));

  let raw = RawDocument {
    document_id:       Uuid::new_v4().to_string(),
    code:              "cert".to_string(),
    name:              "cert".to_string(),
    validity_days:     -1,
    anticipation_days: 7,
    is_universal:      false,
    emission_date:     None,
    processing_date:   None,
    expiration_date:   None,
    state_id:          None,
  };
  assert!(matches!(raw.into_document(), Err(Error::Decode(_))));

  assert!(matches!(decode_audit_kind("bogus"), Err(Error::Decode(_))));
  assert!(matches!(decode_run_mode("bogus"), Err(Error::Decode(_))));
}
