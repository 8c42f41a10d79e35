//! Authorization module for the Pocket pane.
//!
//! This module provides:
//! - `Session`: in-memory request/access tokens for the process lifetime
//! - `TokenStore`: the persisted credential in `pocket.data`
//! - `AuthFlow`: the state machine evaluated on every refresh tick
//! - `RetryPolicy`/`Backoff`: pacing for failed network calls

pub mod flow;
pub mod retry;
pub mod session;
pub mod store;

pub use flow::{AuthFlow, Content, Evaluation};
pub use retry::{Backoff, RetryPolicy};
pub use session::{AuthState, Credential, Session};
pub use store::{StoreError, TokenStore};
