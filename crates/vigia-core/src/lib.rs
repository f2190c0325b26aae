//! Core types and trait definitions for the Vigia document lifecycle engine.
//!
//! This crate is deliberately free of database and runtime dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod aggregate;
pub mod assignment;
pub mod audit;
pub mod dates;
pub mod document;
pub mod error;
pub mod evaluate;
pub mod state;
pub mod store;

pub use error::{Error, Result};
