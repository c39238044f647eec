//! HTTP client for assessment-api.

mod client;

pub use client::{ApiClient, ErrorBody, StatusReport};
