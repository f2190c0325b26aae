//! Error type for `vigia-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vigia_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored value that is not a date failed to decode, e.g. an unknown
  /// enum tag or an out-of-range integer.
  #[error("corrupt row: {0}")]
  Decode(String),

  #[error("document not found: {0}")]
  DocumentNotFound(uuid::Uuid),

  #[error("assignment not found: {0}")]
  AssignmentNotFound(uuid::Uuid),

  #[error("holder not found: {0}")]
  HolderNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
