//! Offline source backed by a JSON catalog.
//!
//! ```json
//! {
//!   "searches": { "salsa": ["/events/1", "/events/2?ref=search"] },
//!   "details": {
//!     "/events/1": {
//!       "title_fragment": "Soirée Salsa",
//!       "date_fragment": "samedi de 20:00 à 01:30",
//!       "location_fragment": "Paris, France"
//!     }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ag_core::{EventSource, RawDetailBundle, SourceId};
use serde::Deserialize;

use crate::{SourceError, event_links};

/// Searches and details captured ahead of time.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSource {
    #[serde(default)]
    searches: HashMap<String, Vec<String>>,
    /// Keys are normalized on load, so `/events/1?x=y` and `/events/1` collide.
    #[serde(default)]
    details: HashMap<SourceId, RawDetailBundle>,
}

impl CatalogSource {
    /// Loads a catalog file.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let contents = fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&contents)?;
        tracing::debug!(
            path = %path.display(),
            searches = catalog.searches.len(),
            details = catalog.details.len(),
            "loaded catalog"
        );
        Ok(catalog)
    }

    /// Parses a catalog from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SourceError> {
        serde_json::from_str(json).map_err(SourceError::InvalidCatalog)
    }
}

impl EventSource for CatalogSource {
    fn list_candidates(&self, keyword: &str) -> Vec<SourceId> {
        self.searches
            .get(keyword)
            .map(event_links)
            .unwrap_or_default()
    }

    fn fetch_detail(&self, id: &SourceId) -> Option<RawDetailBundle> {
        self.details.get(id).cloned()
    }
}
