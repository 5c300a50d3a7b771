//! Source backed by an HTTP fetch service.
//!
//! The service does the page rendering and text extraction; this client only
//! speaks its two endpoints:
//!
//! - `GET {endpoint}/candidates?q=<keyword>` → JSON array of links
//! - `GET {endpoint}/detail?link=<link>` → JSON [`RawDetailBundle`], `404` if unknown

use std::fmt;
use std::time::Duration;

use ag_core::{EventSource, RawDetailBundle, SourceId};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::{SourceError, event_links};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Fetch service client.
///
/// Owns a tokio runtime so it can serve the blocking [`EventSource`]
/// interface. Safe to share across threads; concurrent calls share the
/// connection pool.
pub struct HttpSource {
    http: reqwest::Client,
    endpoint: String,
    runtime: tokio::runtime::Runtime,
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSource")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpSource {
    /// Creates a client for `endpoint` with a per-request `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let endpoint = endpoint.into();
        let trimmed = endpoint.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(SourceError::InvalidEndpoint {
                endpoint,
                reason: "endpoint cannot be empty",
            });
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(SourceError::InvalidEndpoint {
                endpoint,
                reason: "endpoint must be an http(s) URL",
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SourceError::ClientBuild)?;
        let runtime = tokio::runtime::Runtime::new().map_err(SourceError::Runtime)?;

        Ok(Self {
            http,
            endpoint: trimmed.to_string(),
            runtime,
        })
    }

    /// Links found for `keyword`.
    pub async fn candidates(&self, keyword: &str) -> Result<Vec<String>, SourceError> {
        let response = self
            .http
            .get(format!("{}/candidates", self.endpoint))
            .query(&[("q", keyword)])
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Detail fragments for `link`, or `None` if the service does not know it.
    pub async fn detail(&self, link: &str) -> Result<Option<RawDetailBundle>, SourceError> {
        let response = self
            .http
            .get(format!("{}/detail", self.endpoint))
            .query(&[("link", link)])
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        Ok(Some(response.json().await?))
    }
}

impl EventSource for HttpSource {
    fn list_candidates(&self, keyword: &str) -> Vec<SourceId> {
        match self.runtime.block_on(self.candidates(keyword)) {
            Ok(links) => event_links(links),
            Err(err) => {
                tracing::warn!(keyword, error = %err, "candidate search failed");
                Vec::new()
            }
        }
    }

    fn fetch_detail(&self, id: &SourceId) -> Option<RawDetailBundle> {
        match self.runtime.block_on(self.detail(id.as_str())) {
            Ok(detail) => detail,
            Err(err) => {
                tracing::warn!(link = %id, error = %err, "detail fetch failed");
                None
            }
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await?;
    Err(parse_api_error(&body).unwrap_or_else(|| SourceError::Api {
        message: format!("status {status}: {body}"),
    }))
}

fn parse_api_error(body: &str) -> Option<SourceError> {
    #[derive(Deserialize)]
    struct ErrorPayload {
        error: ErrorDetails,
    }

    #[derive(Deserialize)]
    struct ErrorDetails {
        message: String,
    }

    serde_json::from_str::<ErrorPayload>(body)
        .ok()
        .map(|payload| SourceError::Api {
            message: payload.error.message,
        })
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    use super::*;

    /// Serves one canned HTTP response on a local port and returns its base URL.
    fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
        });
        format!("http://{addr}")
    }

    /// A local URL nothing listens on.
    fn closed_endpoint() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    fn source(endpoint: &str) -> HttpSource {
        HttpSource::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn rejects_bad_endpoints() {
        assert!(matches!(
            HttpSource::new("  ", DEFAULT_TIMEOUT),
            Err(SourceError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            HttpSource::new("ftp://example.org", DEFAULT_TIMEOUT),
            Err(SourceError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let source = source("http://localhost:8080/");
        assert_eq!(source.endpoint, "http://localhost:8080");
    }

    #[test]
    fn debug_shows_endpoint_only() {
        let debug = format!("{:?}", source("http://localhost:8080"));
        assert!(debug.contains("http://localhost:8080"));
    }

    #[test]
    fn lists_event_links_from_service() {
        let endpoint = serve_once("200 OK", r#"["/events/1?ref=x", "/groups/2", "/events/3"]"#);
        let links: Vec<String> = source(&endpoint)
            .list_candidates("salsa")
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(links, vec!["/events/1", "/events/3"]);
    }

    #[test]
    fn fetches_detail_bundle() {
        let endpoint = serve_once(
            "200 OK",
            r#"{"title_fragment": "Tango", "date_fragment": "demain à 20:00", "location_fragment": "Paris"}"#,
        );
        let detail = source(&endpoint)
            .fetch_detail(&SourceId::parse("/events/1").unwrap())
            .unwrap();
        assert_eq!(detail.title_fragment, "Tango");
        assert_eq!(detail.date_fragment, "demain à 20:00");
    }

    #[test]
    fn missing_detail_is_absent() {
        let endpoint = serve_once("404 Not Found", "");
        let source = source(&endpoint);
        let id = SourceId::parse("/events/404").unwrap();
        assert!(matches!(source.runtime.block_on(source.detail(id.as_str())), Ok(None)));
    }

    #[test]
    fn service_error_message_is_surfaced() {
        let endpoint = serve_once("500 Internal Server Error", r#"{"error": {"message": "browser crashed"}}"#);
        let source = source(&endpoint);
        let err = source.runtime.block_on(source.candidates("salsa")).unwrap_err();
        assert_eq!(err.to_string(), "fetch service error: browser crashed");
    }

    #[test]
    fn unreachable_service_is_a_soft_failure() {
        let source = source(&closed_endpoint());
        assert!(source.list_candidates("salsa").is_empty());
        assert!(source.fetch_detail(&SourceId::parse("/events/1").unwrap()).is_none());
    }

    #[test]
    fn parse_api_error_requires_message() {
        assert!(parse_api_error(r#"{"error": {"message": "nope"}}"#).is_some());
        assert!(parse_api_error("plain text").is_none());
    }
}
