//! Client for the e-signature service REST API.
//!
//! Provides the authenticated HTTP client ([`EsignClient`]), the retry
//! policy applied to transient failures, the wire models, and the
//! [`EsignApi`] capability trait that lets the sync pipeline run against
//! either the real service or a test double.

pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod retry;

pub use api::EsignApi;
pub use client::{ClientConfig, EsignClient};
pub use error::{EsignError, EsignResult};
pub use retry::RetryPolicy;
