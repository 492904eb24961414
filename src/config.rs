//! Process configuration from environment variables.
//!
//! | Variable              | Default                                                   |
//! |-----------------------|-----------------------------------------------------------|
//! | `DATA_CUACA_BASE_URL` | `https://raw.githubusercontent.com/infoBMKG/data-cuaca/main` |
//! | `DATA_PATH_TEMPLATE`  | `data/{code}.json`                                        |
//! | `CITIES_PATH`         | `data/cities.json` (path or URL)                          |
//! | `SUGGEST_LIMIT`       | `5`                                                       |
//! | `GITHUB_TOKEN`        | unset                                                     |

use crate::city::CatalogSource;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/infoBMKG/data-cuaca/main";
pub const DEFAULT_DATA_PATH_TEMPLATE: &str = "data/{code}.json";
pub const DEFAULT_CITIES_PATH: &str = "data/cities.json";
pub const DEFAULT_SUGGEST_LIMIT: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("SUGGEST_LIMIT must be a non-negative integer, got '{0}'")]
    InvalidLimit(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub base_url: String,
    pub data_path_template: String,
    pub cities: CatalogSource,
    pub suggest_limit: usize,
    pub github_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_path_template: DEFAULT_DATA_PATH_TEMPLATE.to_string(),
            cities: CatalogSource::parse(DEFAULT_CITIES_PATH),
            suggest_limit: DEFAULT_SUGGEST_LIMIT,
            github_token: None,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary lookup (for testing).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let suggest_limit = match lookup("SUGGEST_LIMIT") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidLimit(raw.clone()))?,
            None => defaults.suggest_limit,
        };

        Ok(Self {
            base_url: lookup("DATA_CUACA_BASE_URL").unwrap_or(defaults.base_url),
            data_path_template: lookup("DATA_PATH_TEMPLATE")
                .unwrap_or(defaults.data_path_template),
            cities: lookup("CITIES_PATH")
                .map(|raw| CatalogSource::parse(&raw))
                .unwrap_or(defaults.cities),
            suggest_limit,
            github_token: lookup("GITHUB_TOKEN").filter(|t| !t.is_empty()),
        })
    }

    /// Full upstream URL of the weather document for a city code.
    pub fn data_url(&self, code: &str) -> String {
        let path = self.data_path_template.replace("{code}", code);
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
