//! Core library for pocketpane.
//!
//! Drives the Pocket three-legged authorization flow for a dashboard pane:
//!
//! - `api`: Pocket OAuth endpoints and the authorization URL
//! - `auth`: session, persisted credential, and the per-tick state machine
//! - `config`: application configuration and directory layout

pub mod api;
pub mod auth;
pub mod config;

pub use api::{ApiClient, ApiError, AuthApi};
pub use auth::{AuthFlow, AuthState, Content, Credential, Evaluation, Session, TokenStore};
pub use config::Config;
