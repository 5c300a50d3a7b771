//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use ag_core::Locale;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory result files are written to.
    pub output_dir: PathBuf,
    /// Language of the date phrases.
    pub locale: Locale,
    /// City name used in result file names.
    pub city: String,
    /// Keywords searched when none are given on the command line.
    pub keywords: Vec<String>,
    /// Default window length in days.
    pub window_days: u32,
    /// Offline catalog file.
    pub catalog: Option<PathBuf>,
    /// Fetch service base URL.
    pub endpoint: Option<String>,
    /// Per-request timeout for the fetch service.
    pub fetch_timeout_secs: u64,
    /// Fetch candidates concurrently.
    pub parallel: bool,
    /// Keep events whose date could not be resolved.
    pub keep_unresolved: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Endpoints may carry credentials in the userinfo part.
        let endpoint = self.endpoint.as_ref().map(|_| "[set]");
        f.debug_struct("Config")
            .field("output_dir", &self.output_dir)
            .field("locale", &self.locale)
            .field("city", &self.city)
            .field("keywords", &self.keywords)
            .field("window_days", &self.window_days)
            .field("catalog", &self.catalog)
            .field("endpoint", &endpoint)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("parallel", &self.parallel)
            .field("keep_unresolved", &self.keep_unresolved)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            output_dir: data_dir.join("output"),
            locale: Locale::default(),
            city: "paris".to_string(),
            keywords: Vec::new(),
            window_days: 7,
            catalog: None,
            endpoint: None,
            fetch_timeout_secs: ag_source::DEFAULT_TIMEOUT.as_secs(),
            parallel: false,
            keep_unresolved: false,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // AGENDA_* environment variables win
        figment = figment.merge(Env::prefixed("AGENDA_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for agenda.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("agenda"))
}

/// Returns the platform-specific data directory for agenda.
///
/// On Linux: `~/.local/share/agenda`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("agenda"))
}
