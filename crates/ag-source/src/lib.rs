//! Event sources for agenda.
//!
//! Implementations of [`ag_core::EventSource`]:
//! - [`CatalogSource`]: searches and details read from a JSON file
//! - [`HttpSource`]: a fetch service reached over HTTP
//!
//! Both treat "nothing found" and "could not fetch" as soft outcomes; only
//! construction can fail.

use std::path::PathBuf;

use ag_core::SourceId;
use thiserror::Error;

mod catalog;
mod http;

pub use catalog::CatalogSource;
pub use http::{DEFAULT_TIMEOUT, HttpSource};

/// Path fragment every event link contains.
const EVENT_PATH: &str = "/events/";

/// Source errors.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read a catalog file.
    #[error("failed to read catalog {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Catalog JSON was malformed.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(#[source] serde_json::Error),
    /// The fetch endpoint is unusable.
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint {
        endpoint: String,
        reason: &'static str,
    },
    /// Failed to build HTTP client.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// Failed to start the async runtime.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// HTTP request failed.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Fetch service returned an error response.
    #[error("fetch service error: {message}")]
    Api { message: String },
}

/// Keeps event links, normalized, in the order given.
fn event_links<I, S>(links: I) -> Vec<SourceId>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    links
        .into_iter()
        .filter_map(|link| {
            let link = link.as_ref();
            if !link.contains(EVENT_PATH) {
                tracing::debug!(link, "skipping non-event link");
                return None;
            }
            SourceId::parse(link).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_links_filters_and_normalizes() {
        let links = event_links([
            "/events/1?acontext=x",
            "/groups/42",
            "/events/2/",
            "https://example.org/events/3#top",
        ]);
        let links: Vec<&str> = links.iter().map(SourceId::as_str).collect();
        assert_eq!(
            links,
            vec!["/events/1", "/events/2/", "https://example.org/events/3"]
        );
    }
}
