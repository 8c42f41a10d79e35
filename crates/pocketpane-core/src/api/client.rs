//! API client for the Pocket OAuth endpoints.
//!
//! Pocket's authorization is a three step dance:
//!
//! 1. POST the consumer key to `/oauth/request` to obtain a request token
//! 2. Send the user to the authorization URL to approve that token
//! 3. POST the request token to `/oauth/authorize` to get an access token
//!
//! The client performs no retries; retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::observer::{ResponseObserver, TracingObserver};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the v3 API endpoints
const API_BASE_URL: &str = "https://getpocket.com/v3";

/// Page the user visits to approve a request token
const AUTHORIZE_PAGE_URL: &str = "https://getpocket.com/auth/authorize";

/// HTTP request timeout in seconds.
/// A stalled call blocks the tick that issued it, so keep it bounded.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Pocket answers in form encoding unless asked for JSON with this header
const X_ACCEPT: &str = "X-Accept";

/// Header carrying Pocket's error description on non-2xx responses
const X_ERROR: &str = "X-Error";

/// Header carrying Pocket's numeric error code (e.g. 158 rejected, 159 already used)
const X_ERROR_CODE: &str = "X-Error-Code";

#[derive(Debug, Serialize)]
struct RequestTokenRequest<'a> {
    consumer_key: &'a str,
    redirect_uri: &'a str,
}

#[derive(Debug, Deserialize)]
struct RequestTokenResponse {
    code: String,
}

#[derive(Debug, Serialize)]
struct AccessTokenRequest<'a> {
    consumer_key: &'a str,
    code: &'a str,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    username: Option<String>,
}

// ============================================================================
// AuthApi
// ============================================================================

/// The remote operations the authorization flow depends on.
#[allow(async_fn_in_trait)]
pub trait AuthApi {
    /// Ask Pocket for a fresh request token.
    async fn obtain_request_token(&self) -> Result<String, ApiError>;

    /// Trade an approved request token for an access token.
    async fn exchange_for_access_token(&self, request_token: &str) -> Result<String, ApiError>;

    /// URL the user opens to approve `request_token`. Pure, never fails.
    fn authorization_url(&self, request_token: &str) -> String;
}

// ============================================================================
// ApiClient
// ============================================================================

/// API client for Pocket.
/// Clone is cheap - reqwest::Client and the observer are both reference counted.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    consumer_key: String,
    redirect_uri: String,
    observer: Arc<dyn ResponseObserver>,
}

impl ApiClient {
    /// Create a new API client for the given consumer key and redirect URI
    pub fn new(
        consumer_key: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: API_BASE_URL.to_string(),
            consumer_key: consumer_key.into(),
            redirect_uri: redirect_uri.into(),
            observer: Arc::new(TracingObserver),
        })
    }

    /// Point the client at a different API root (no trailing slash)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Replace the observer that receives raw response bodies
    pub fn with_observer(mut self, observer: Arc<dyn ResponseObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// POST a JSON body and decode the JSON response.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .header(X_ACCEPT, "application/json")
            .header(header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let header_value = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
        };
        let error_header = header_value(X_ERROR);
        let error_code = header_value(X_ERROR_CODE).and_then(|v| v.parse::<u16>().ok());
        let text = response.text().await?;

        self.observer.on_response(&url, status, &text);

        if !status.is_success() {
            return Err(ApiError::from_status(
                status,
                error_code,
                error_header.as_deref(),
                &text,
            ));
        }

        decode_body(&url, &text)
    }
}

impl AuthApi for ApiClient {
    async fn obtain_request_token(&self) -> Result<String, ApiError> {
        let request = RequestTokenRequest {
            consumer_key: &self.consumer_key,
            redirect_uri: &self.redirect_uri,
        };

        let response: RequestTokenResponse = self.post("/oauth/request", &request).await?;
        if response.code.is_empty() {
            return Err(ApiError::decode(
                &format!("{}/oauth/request", self.base_url),
                "",
                "empty request token",
            ));
        }
        Ok(response.code)
    }

    async fn exchange_for_access_token(&self, request_token: &str) -> Result<String, ApiError> {
        let request = AccessTokenRequest {
            consumer_key: &self.consumer_key,
            code: request_token,
        };

        let response: AccessTokenResponse = match self.post("/oauth/authorize", &request).await {
            Ok(response) => response,
            // Pocket answers a bare 403 until the user approves the request token.
            // A 403 with an error code (rejected, already used, bad key) is reported as is.
            Err(ApiError::Status {
                status,
                code: None,
                ..
            }) if status == StatusCode::FORBIDDEN => {
                return Err(ApiError::AuthorizationPending);
            }
            Err(e) => return Err(e),
        };

        if response.access_token.is_empty() {
            return Err(ApiError::decode(
                &format!("{}/oauth/authorize", self.base_url),
                "",
                "empty access token",
            ));
        }
        debug!(username = ?response.username, "Access token issued");
        Ok(response.access_token)
    }

    fn authorization_url(&self, request_token: &str) -> String {
        authorization_url(request_token, &self.redirect_uri)
    }
}

/// Build the approval URL. Tokens and redirect are inserted verbatim.
pub fn authorization_url(request_token: &str, redirect_uri: &str) -> String {
    format!(
        "{}?request_token={}&redirect_uri={}",
        AUTHORIZE_PAGE_URL, request_token, redirect_uri
    )
}

fn decode_body<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::decode(url, body, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url() {
        assert_eq!(
            authorization_url("tok1", "http://localhost"),
            "https://getpocket.com/auth/authorize?request_token=tok1&redirect_uri=http://localhost"
        );
    }

    #[test]
    fn test_client_authorization_url_uses_redirect_uri() {
        let client = ApiClient::new("key", "http://localhost").expect("client builds");
        assert_eq!(
            client.authorization_url("tok1"),
            "https://getpocket.com/auth/authorize?request_token=tok1&redirect_uri=http://localhost"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(RequestTokenRequest {
            consumer_key: "1234-abcd",
            redirect_uri: "http://localhost",
        })
        .expect("serializes");
        assert_eq!(
            body,
            serde_json::json!({"consumer_key": "1234-abcd", "redirect_uri": "http://localhost"})
        );

        let body = serde_json::to_value(AccessTokenRequest {
            consumer_key: "1234-abcd",
            code: "dcba4321",
        })
        .expect("serializes");
        assert_eq!(
            body,
            serde_json::json!({"consumer_key": "1234-abcd", "code": "dcba4321"})
        );
    }

    #[test]
    fn test_decode_access_token_response() {
        let json = r#"{"access_token":"5678defg-5678-defg-5678-defg56","username":"pocketuser"}"#;
        let resp: AccessTokenResponse =
            decode_body("https://getpocket.com/v3/oauth/authorize", json).expect("decodes");
        assert_eq!(resp.access_token, "5678defg-5678-defg-5678-defg56");
        assert_eq!(resp.username.as_deref(), Some("pocketuser"));
    }

    #[test]
    fn test_decode_failure_names_url_and_body() {
        let err = decode_body::<RequestTokenResponse>(
            "https://getpocket.com/v3/oauth/request",
            "<html>oops</html>",
        )
        .unwrap_err();

        match err {
            ApiError::Decode { url, body, .. } => {
                assert_eq!(url, "https://getpocket.com/v3/oauth/request");
                assert_eq!(body, "<html>oops</html>");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    // -------------------------------------------------------------------------
    // Request path against a local server
    // -------------------------------------------------------------------------

    use std::sync::Mutex;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Observer that keeps every response it is shown
    #[derive(Default)]
    struct RecordingObserver {
        seen: Mutex<Vec<(String, StatusCode, String)>>,
    }

    impl ResponseObserver for RecordingObserver {
        fn on_response(&self, url: &str, status: StatusCode, body: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((url.to_string(), status, body.to_string()));
        }
    }

    fn http_response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut out = format!("HTTP/1.1 {}\r\n", status_line);
        for (name, value) in headers {
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        out.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ));
        out
    }

    /// Accept one connection, answer with `response`, and return the raw request
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v3", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                    let content_length = head
                        .lines()
                        .find_map(|l| l.strip_prefix("content-length:"))
                        .and_then(|v| v.trim().parse::<usize>().ok())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + content_length {
                        break;
                    }
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });

        (base_url, handle)
    }

    /// Client aimed at `base_url`, bypassing any proxy from the environment
    fn local_client(base_url: &str, observer: Arc<RecordingObserver>) -> ApiClient {
        let mut client = ApiClient::new("1234-abcd", "http://localhost")
            .expect("client builds")
            .with_base_url(base_url)
            .with_observer(observer);
        client.client = Client::builder().no_proxy().build().expect("client builds");
        client
    }

    #[tokio::test]
    async fn test_obtain_request_token_over_http() {
        let (base_url, server) = serve_once(http_response(
            "200 OK",
            &[],
            r#"{"code":"dcba4321-dcba-4321-dcba-4321dc"}"#,
        ))
        .await;
        let observer = Arc::new(RecordingObserver::default());
        // Trailing slash is trimmed before paths are appended
        let client = local_client(&format!("{}/", base_url), observer.clone());

        let token = client.obtain_request_token().await.unwrap();
        assert_eq!(token, "dcba4321-dcba-4321-dcba-4321dc");

        let request = server.await.unwrap();
        let lower = request.to_lowercase();
        assert!(request.starts_with("POST /v3/oauth/request HTTP/1.1"));
        assert!(lower.contains("x-accept: application/json"));
        assert!(lower.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"consumer_key":"1234-abcd","redirect_uri":"http://localhost"}"#));

        let seen = observer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, format!("{}/oauth/request", base_url));
        assert_eq!(seen[0].1, StatusCode::OK);
        assert_eq!(seen[0].2, r#"{"code":"dcba4321-dcba-4321-dcba-4321dc"}"#);
    }

    #[tokio::test]
    async fn test_exchange_over_http() {
        let (base_url, server) = serve_once(http_response(
            "200 OK",
            &[],
            r#"{"access_token":"5678defg","username":"pocketuser"}"#,
        ))
        .await;
        let client = local_client(&base_url, Arc::new(RecordingObserver::default()));

        let token = client.exchange_for_access_token("dcba4321").await.unwrap();
        assert_eq!(token, "5678defg");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v3/oauth/authorize HTTP/1.1"));
        assert!(request.ends_with(r#"{"consumer_key":"1234-abcd","code":"dcba4321"}"#));
    }

    #[tokio::test]
    async fn test_bare_forbidden_is_pending() {
        let (base_url, _server) = serve_once(http_response("403 Forbidden", &[], "")).await;
        let observer = Arc::new(RecordingObserver::default());
        let client = local_client(&base_url, observer.clone());

        let err = client.exchange_for_access_token("dcba4321").await.unwrap_err();
        assert!(err.is_pending());
        assert_eq!(observer.seen.lock().unwrap()[0].1, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_forbidden_with_error_code_is_reported() {
        let (base_url, _server) = serve_once(http_response(
            "403 Forbidden",
            &[("X-Error-Code", "158"), ("X-Error", "User rejected code.")],
            "",
        ))
        .await;
        let client = local_client(&base_url, Arc::new(RecordingObserver::default()));

        let err = client.exchange_for_access_token("dcba4321").await.unwrap_err();
        match err {
            ApiError::Status {
                status,
                code,
                ref message,
            } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(code, Some(158));
                assert_eq!(message, "User rejected code. (error 158)");
            }
            ref other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_header_becomes_status_message() {
        let (base_url, _server) = serve_once(http_response(
            "400 Bad Request",
            &[("X-Error-Code", "138"), ("X-Error", "Missing consumer key.")],
            "",
        ))
        .await;
        let client = local_client(&base_url, Arc::new(RecordingObserver::default()));

        let err = client.obtain_request_token().await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Pocket returned 400 Bad Request: Missing consumer key. (error 138)"
        );
    }

    #[tokio::test]
    async fn test_empty_request_token_is_decode_error() {
        let (base_url, _server) =
            serve_once(http_response("200 OK", &[], r#"{"code":""}"#)).await;
        let client = local_client(&base_url, Arc::new(RecordingObserver::default()));

        let err = client.obtain_request_token().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref reason, .. } if reason == "empty request token"));
    }

    #[tokio::test]
    async fn test_empty_access_token_is_decode_error() {
        let (base_url, _server) =
            serve_once(http_response("200 OK", &[], r#"{"access_token":""}"#)).await;
        let client = local_client(&base_url, Arc::new(RecordingObserver::default()));

        let err = client.exchange_for_access_token("dcba4321").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref reason, .. } if reason == "empty access token"));
    }
}
