//! # Application Layer
//!
//! Use-case orchestration over the domain and infrastructure layers.
//!
//! - [`error`]: Pipeline error types
//! - [`services`]: Derivation pipeline, rate cache and retry policy

pub mod error;
pub mod services;

pub use error::{PipelineError, PipelineResult};
