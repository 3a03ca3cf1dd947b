//! # Infrastructure Layer
//!
//! Adapters for the engine's external collaborators.
//!
//! - [`fx`]: FX rate providers
//! - [`persistence`]: Repositories and the derivation store

pub mod fx;
pub mod persistence;
