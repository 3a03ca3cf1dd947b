//! # Domain Layer
//!
//! Pure business types and rules of the derivation engine.
//!
//! Nothing in this layer performs I/O: every operation is a deterministic
//! function of its inputs.

pub mod entities;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::{DomainError, DomainResult};
