//! Error types for `vigia-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// A state code the engine depends on is absent from the catalog.
  /// This is a broken deployment; a reconciliation run must abort on it.
  #[error("state catalog is missing required code {0:?}")]
  MissingStateCode(&'static str),

  #[error("state catalog contains code {0:?} more than once")]
  DuplicateStateCode(String),

  #[error("unknown state id: {0}")]
  UnknownState(Uuid),

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
