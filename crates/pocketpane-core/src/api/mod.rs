//! REST API client module for the Pocket authorization endpoints.
//!
//! This module provides the `ApiClient` for obtaining a request token,
//! exchanging it for an access token, and building the URL the user
//! visits to approve the request.
//!
//! Raw responses are reported to a `ResponseObserver` rather than logged
//! from inside the request path.

pub mod client;
pub mod error;
pub mod observer;

pub use client::{ApiClient, AuthApi};
pub use error::ApiError;
pub use observer::{ResponseObserver, TracingObserver};
