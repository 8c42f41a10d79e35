//! Application state management for pocketpane.
//!
//! The `App` owns the Pocket pane, the refresh schedule, and the small amount
//! of UI state (scroll offset, help overlay) the terminal host needs.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use ratatui::widgets::{Paragraph, Wrap};
use tracing::{debug, info, warn};

use pocketpane_core::auth::AuthState;
use pocketpane_core::config::CONSUMER_KEY_ENV;
use pocketpane_core::{ApiClient, AuthFlow, Config, Content, Session, TokenStore};

// ============================================================================
// Constants
// ============================================================================

/// Number of lines to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: u16 = 10;

/// Body shown before the first evaluation completes
const CONNECTING_MESSAGE: &str = "Connecting to Pocket...";

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    Quitting,
}

// ============================================================================
// Pocket pane
// ============================================================================

/// The dashboard widget wrapping the authorization flow.
pub struct PocketPane {
    flow: AuthFlow<ApiClient>,
    session: Session,
    content: Content,
}

impl PocketPane {
    pub fn new(flow: AuthFlow<ApiClient>) -> Self {
        let content = Content::new(flow.title(), CONNECTING_MESSAGE);
        Self {
            flow,
            session: Session::new(),
            content,
        }
    }

    /// Build the pane from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let consumer_key = config.consumer_key().ok_or_else(|| {
            anyhow!(
                "No Pocket consumer key configured.\n\nSet {} or add \"consumer_key\" to {}",
                CONSUMER_KEY_ENV,
                Config::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "config.json".to_string()),
            )
        })?;

        let api = ApiClient::new(consumer_key, config.redirect_uri.as_str())?;
        let store = TokenStore::in_config_dir()?;
        debug!(path = %store.path().display(), "Credential store configured");

        let flow = AuthFlow::new(api, store)
            .with_title(config.title.as_str())
            .with_retry_policy(config.retry);
        Ok(Self::new(flow))
    }

    /// Run one evaluation of the flow. Returns true if the body changed.
    pub async fn refresh(&mut self) -> bool {
        let session = std::mem::take(&mut self.session);
        let evaluation = self.flow.evaluate(session, Instant::now()).await;
        self.session = evaluation.session;

        let changed = evaluation.content.body != self.content.body;
        self.content = evaluation.content;
        changed
    }

    /// The `(title, body, ok)` view of the last evaluation
    pub fn content(&self) -> (&str, &str, bool) {
        (
            self.content.title.as_str(),
            self.content.body.as_str(),
            self.content.ok,
        )
    }

    pub fn state(&self) -> AuthState {
        self.session.state()
    }

    /// Abandon the pending request token so the next refresh starts over
    pub fn reset(&mut self) {
        let session = std::mem::take(&mut self.session);
        self.session = self.flow.reset(session);
    }

    /// Time until the flow will call Pocket again after a failure
    pub fn retry_in(&self, now: Instant) -> Option<Duration> {
        self.flow.backoff().retry_in(now)
    }
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    pub state: AppState,
    pub title: String,
    pub pane: Option<PocketPane>,
    /// Why the pane could not be built, shown in its place
    pub setup_error: Option<String>,
    pub scroll: u16,
    pub last_refresh: Option<DateTime<Local>>,
    pub status_message: Option<String>,
    /// Inner width of the pane, used to count wrapped lines
    pane_width: Option<u16>,
    refresh_interval: Duration,
    next_refresh: Instant,
}

impl App {
    pub fn new(config: Config) -> Self {
        let (pane, setup_error) = match PocketPane::from_config(&config) {
            Ok(pane) => (Some(pane), None),
            Err(e) => {
                warn!(error = %e, "Pocket pane unavailable");
                (None, Some(e.to_string()))
            }
        };
        Self::with_pane(&config, pane, setup_error)
    }

    fn with_pane(config: &Config, pane: Option<PocketPane>, setup_error: Option<String>) -> Self {
        Self {
            state: AppState::Normal,
            title: config.title.clone(),
            pane,
            setup_error,
            scroll: 0,
            last_refresh: None,
            status_message: None,
            pane_width: None,
            refresh_interval: config.refresh_interval(),
            next_refresh: Instant::now(),
        }
    }

    /// Whether the pane should be evaluated on this loop iteration
    pub fn refresh_due(&self, now: Instant) -> bool {
        self.pane.is_some() && now >= self.next_refresh
    }

    /// Evaluate the pane and schedule the next tick.
    pub async fn refresh(&mut self) {
        let now = Instant::now();
        self.next_refresh = now.checked_add(self.refresh_interval).unwrap_or(now);

        if let Some(ref mut pane) = self.pane {
            if pane.refresh().await {
                self.scroll = 0;
            }
            self.last_refresh = Some(Local::now());
        }
    }

    /// Force an evaluation on the next loop iteration
    pub fn request_refresh(&mut self) {
        self.next_refresh = Instant::now();
    }

    pub fn reset_authorization(&mut self) {
        if let Some(ref mut pane) = self.pane {
            info!("Resetting Pocket authorization");
            pane.reset();
            self.scroll = 0;
            self.status_message = Some("Authorization reset".to_string());
            self.request_refresh();
        }
    }

    /// The `(title, body, ok)` triple the pane should render
    pub fn content(&self) -> (&str, &str, bool) {
        match (&self.pane, &self.setup_error) {
            (Some(pane), _) => pane.content(),
            (None, Some(error)) => (self.title.as_str(), error.as_str(), true),
            (None, None) => (self.title.as_str(), "", true),
        }
    }

    /// Record the width the pane body is wrapped to
    pub fn set_pane_width(&mut self, width: u16) {
        self.pane_width = Some(width);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.max_scroll();
        self.scroll = self.scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    /// Last line of the body that can be scrolled to the top of the view
    fn max_scroll(&self) -> u16 {
        let (_, body, _) = self.content();
        let lines = match self.pane_width {
            Some(width) if width > 0 => Paragraph::new(body)
                .wrap(Wrap { trim: false })
                .line_count(width),
            _ => body.lines().count(),
        };
        u16::try_from(lines.max(1) - 1).unwrap_or(u16::MAX)
    }
}

// ============================================================================
// Tests
// ============================================================================
