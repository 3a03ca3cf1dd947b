//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! - [`DerivationPipeline`]: Runs FX retrieval, conversion and metric derivation
//! - [`RateCache`]: Single-flight FX rate table cache
//! - [`RetryPolicy`]: Bounded exponential backoff for remote calls

pub mod derivation_pipeline;
pub mod rate_cache;
pub mod retry;

pub use derivation_pipeline::{
    DerivationOutput, DerivationPipeline, DerivationRequest, PipelineConfig,
};
pub use rate_cache::RateCache;
pub use retry::{RetryFailure, RetryPolicy, Retryable};
