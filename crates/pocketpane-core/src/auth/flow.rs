//! The authorization state machine.
//!
//! `AuthFlow::evaluate` is called once per refresh tick. Depending on the
//! session it either fetches a request token, tries to exchange the pending
//! request token for an access token, or simply reports that the pane is
//! authorized. Every failure degrades to text for the pane and a later retry.
//!
//! | State                | Call                       | Success                          | Failure              |
//! |----------------------|----------------------------|----------------------------------|----------------------|
//! | NoToken              | `obtain_request_token`     | keep token, show approval URL    | show error           |
//! | PendingAuthorization | `exchange_for_access_token`| keep + persist token, "Authorized" | show same URL (+ error) |
//! | Authorized           | none                       | `"done" + token`                 | -                    |

use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::retry::{Backoff, RetryPolicy};
use super::{Credential, Session, TokenStore};
use crate::api::AuthApi;

/// Pane title used when none is configured
pub const DEFAULT_TITLE: &str = "Pocket";

/// What the pane shows after a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    pub title: String,
    pub body: String,
    /// Always true: failures are reported through `body`
    pub ok: bool,
}

impl Content {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ok: true,
        }
    }

    /// The `(title, body, ok)` triple the dashboard widgets speak
    pub fn into_parts(self) -> (String, String, bool) {
        (self.title, self.body, self.ok)
    }
}

/// Result of one tick: the updated session and what to display.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub session: Session,
    pub content: Content,
}

pub struct AuthFlow<A> {
    api: A,
    store: TokenStore,
    title: String,
    policy: RetryPolicy,
    backoff: Backoff,
    /// The persisted credential is consulted at most once per process
    credential_checked: bool,
    /// Shown again while waiting out a backoff delay
    last_body: Option<String>,
}

impl<A: AuthApi> AuthFlow<A> {
    pub fn new(api: A, store: TokenStore) -> Self {
        Self {
            api,
            store,
            title: DEFAULT_TITLE.to_string(),
            policy: RetryPolicy::default(),
            backoff: Backoff::default(),
            credential_checked: false,
            last_body: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Run one tick of the flow.
    pub async fn evaluate(&mut self, mut session: Session, now: Instant) -> Evaluation {
        if session.access_token.is_none() && !self.credential_checked {
            self.credential_checked = true;
            match self.store.load() {
                Ok(Credential {
                    access_token: Some(token),
                }) => {
                    info!(path = %self.store.path().display(), "Loaded persisted Pocket credential");
                    session.access_token = Some(token);
                }
                Ok(_) => debug!("Persisted credential has no access token"),
                Err(e) if e.is_missing() => debug!("No persisted credential yet"),
                Err(e) => warn!(error = %e, "Ignoring unreadable credential file"),
            }
        }

        if let Some(ref token) = session.access_token {
            let body = format!("done{}", token);
            return self.finish(session, body);
        }

        self.authorize(session, now).await
    }

    /// Abandon a pending request token and the failure history.
    ///
    /// The next evaluation starts again from `NoToken`. An access token,
    /// if one was obtained, is kept.
    pub fn reset(&mut self, mut session: Session) -> Session {
        if session.request_token.take().is_some() {
            info!("Discarded pending Pocket request token");
        }
        self.backoff = Backoff::default();
        self.last_body = None;
        session
    }

    async fn authorize(&mut self, mut session: Session, now: Instant) -> Evaluation {
        if self.backoff.exhausted(&self.policy) {
            let body = format!(
                "Gave up after {} failed attempts. Reset to try again.",
                self.backoff.failures()
            );
            return self.finish(session, body);
        }

        if !self.backoff.ready(now) {
            let body = self.last_body.clone().unwrap_or_default();
            return self.finish(session, body);
        }

        let body = match session.request_token.clone() {
            None => match self.api.obtain_request_token().await {
                Ok(request_token) => {
                    info!("Obtained Pocket request token");
                    self.backoff.record_success();
                    let body = self.approval_prompt(&request_token);
                    session.request_token = Some(request_token);
                    body
                }
                Err(e) => {
                    warn!(error = %e, "Failed to obtain request token");
                    self.backoff.record_failure(&self.policy, now);
                    e.to_string()
                }
            },
            Some(request_token) => {
                match self.api.exchange_for_access_token(&request_token).await {
                    Ok(access_token) => {
                        self.backoff.record_success();
                        self.complete(&mut session, access_token)
                    }
                    Err(e) if e.is_pending() => {
                        debug!("Request token not approved yet");
                        self.backoff.record_failure(&self.policy, now);
                        self.approval_prompt(&request_token)
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to exchange request token");
                        self.backoff.record_failure(&self.policy, now);
                        format!("{}\n\n{}", self.approval_prompt(&request_token), e)
                    }
                }
            }
        };

        self.last_body = Some(body.clone());
        self.finish(session, body)
    }

    /// Record and persist a freshly issued access token.
    ///
    /// A failed write is reported but the session stays authorized.
    fn complete(&mut self, session: &mut Session, access_token: String) -> String {
        session.access_token = Some(access_token.clone());
        match self.store.save(&Credential::new(access_token)) {
            Ok(()) => {
                info!("Pocket authorization complete");
                "Authorized".to_string()
            }
            Err(e) => {
                error!(error = %e, "Failed to persist Pocket credential");
                e.to_string()
            }
        }
    }

    fn approval_prompt(&self, request_token: &str) -> String {
        format!(
            "Please click on {} to Authorize the app",
            self.api.authorization_url(request_token)
        )
    }

    fn finish(&self, session: Session, body: String) -> Evaluation {
        Evaluation {
            session,
            content: Content::new(self.title.clone(), body),
        }
    }
}
