//! Error type for `vigia-engine`, generic over the store backend.

use thiserror::Error;

/// Errors that abort an engine operation outright.
///
/// Per-row persistence failures never surface here — the reconciler absorbs
/// them into the run summary and keeps going. What does surface is the fatal
/// kind: a broken state catalog, or a store failure on the read side.
#[derive(Debug, Error)]
pub enum Error<E>
where
  E: std::error::Error + Send + Sync + 'static,
{
  #[error(transparent)]
  Core(#[from] vigia_core::Error),

  #[error("store error: {0}")]
  Store(E),
}

pub type Result<T, E> = std::result::Result<T, Error<E>>;
