//! # FX Rate Providers
//!
//! The [`FxRateProvider`] port and its adapters.
//!
//! - [`HttpFxRateProvider`]: JSON rates endpoint over HTTP
//! - [`StaticFxRateProvider`]: Fixed rates for offline use and tests

pub mod error;
pub mod http_client;
pub mod http_provider;
pub mod static_provider;
pub mod traits;

pub use error::{FxProviderError, FxProviderResult};
pub use http_provider::HttpFxRateProvider;
pub use static_provider::StaticFxRateProvider;
pub use traits::FxRateProvider;
