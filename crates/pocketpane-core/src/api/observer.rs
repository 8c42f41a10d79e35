use reqwest::StatusCode;
use tracing::debug;

use super::ApiError;

/// Receives every raw response the client reads, before it is decoded.
pub trait ResponseObserver: Send + Sync {
    fn on_response(&self, url: &str, status: StatusCode, body: &str);
}

/// Default observer: response bodies go to the debug log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ResponseObserver for TracingObserver {
    fn on_response(&self, url: &str, status: StatusCode, body: &str) {
        debug!(
            url,
            status = %status,
            body = %ApiError::truncate_body(body),
            "Pocket response"
        );
    }
}
