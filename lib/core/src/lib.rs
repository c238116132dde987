//! Core types shared across the zadarma-connect crates.
//!
//! This crate provides the layered error `Result` alias and the
//! correlation ids attached to log spans for batches and single requests.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{BatchId, RequestId};
