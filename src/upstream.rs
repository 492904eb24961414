//! Client for the infoBMKG/data-cuaca repository.
//!
//! Weather documents are passed through as opaque JSON. Listing and raw file
//! access go through the GitHub contents API and raw.githubusercontent.com.

use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::Settings;

pub const GITHUB_API_BASE: &str = "https://api.github.com/repos/infoBMKG/data-cuaca/contents";
pub const RAW_BASE: &str = "https://raw.githubusercontent.com/infoBMKG/data-cuaca/main";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const USER_AGENT: &str = concat!("cuaca/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Request to {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("Response from {url} is not valid JSON: {reason}")]
    InvalidJson { url: String, reason: String },
}

impl UpstreamError {
    pub fn url(&self) -> &str {
        match self {
            Self::Network { url, .. } | Self::Status { url, .. } | Self::InvalidJson { url, .. } => {
                url
            }
        }
    }
}

/// Blocking HTTP client. Call from `spawn_blocking` inside async code.
#[derive(Clone)]
pub struct Upstream {
    agent: ureq::Agent,
    github_token: Option<String>,
}

impl Upstream {
    pub fn new(github_token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            github_token,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.github_token.clone())
    }

    /// Weather document for a resolved city code.
    pub fn weather(&self, settings: &Settings, code: &str) -> Result<Value, UpstreamError> {
        let url = settings.data_url(code);
        let text = self.get_text(&url, false)?;
        decode_json(&url, &text)
    }

    /// Directory listing from the GitHub contents API.
    pub fn list_contents(&self, path: Option<&str>) -> Result<Value, UpstreamError> {
        let url = contents_url(path);
        let text = self.get_text(&url, true)?;
        decode_json(&url, &text)
    }

    /// Raw file text from the repository's main branch.
    pub fn fetch_raw(&self, path: &str) -> Result<String, UpstreamError> {
        let url = raw_url(path);
        self.get_text(&url, true)
    }

    fn get_text(&self, url: &str, authorized: bool) -> Result<String, UpstreamError> {
        let mut request = self.agent.get(url);
        if authorized {
            if let Some(ref token) = self.github_token {
                request = request.set("Authorization", &format!("Bearer {}", token));
            }
        }

        let response = match request.call() {
            Ok(r) => r,
            Err(ureq::Error::Status(status, _)) => {
                tracing::warn!("GET {} -> {}", url, status);
                return Err(UpstreamError::Status {
                    url: url.to_string(),
                    status,
                });
            }
            Err(e) => {
                tracing::warn!("GET {} failed: {}", url, e);
                return Err(UpstreamError::Network {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if response.status() != 200 {
            return Err(UpstreamError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        response.into_string().map_err(|e| UpstreamError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

pub fn contents_url(path: Option<&str>) -> String {
    match path.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(p) => format!("{}/{}", GITHUB_API_BASE, p),
        None => GITHUB_API_BASE.to_string(),
    }
}

pub fn raw_url(path: &str) -> String {
    format!("{}/{}", RAW_BASE, path.trim_start_matches('/'))
}

/// Decode an upstream body, keeping the URL for error reporting.
pub fn decode_json(url: &str, text: &str) -> Result<Value, UpstreamError> {
    serde_json::from_str(text).map_err(|e| UpstreamError::InvalidJson {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contents_url() {
        assert_eq!(contents_url(None), GITHUB_API_BASE);
        assert_eq!(contents_url(Some("")), GITHUB_API_BASE);
        assert_eq!(contents_url(Some("/data/")), format!("{}/data", GITHUB_API_BASE));
    }

    #[test]
    fn test_raw_url() {
        assert_eq!(
            raw_url("data/aceh.json"),
            "https://raw.githubusercontent.com/infoBMKG/data-cuaca/main/data/aceh.json"
        );
        assert_eq!(raw_url("/data/aceh.json"), raw_url("data/aceh.json"));
    }

    #[test]
    fn test_decode_json_passthrough() {
        let value = decode_json("u", r#"{"lokasi": {"adm4": "31.71"}, "data": [1, 2]}"#).unwrap();
        assert_eq!(value["lokasi"]["adm4"], "31.71");
        assert_eq!(value["data"][1], 2);
    }

    #[test]
    fn test_decode_json_invalid() {
        let err = decode_json("https://x/data.json", "<html>").unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidJson { .. }));
        assert_eq!(err.url(), "https://x/data.json");
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let upstream = Upstream::new(None);
        let settings = Settings {
            base_url: "http://127.0.0.1:1".into(),
            ..Settings::default()
        };
        let err = upstream.weather(&settings, "JKT").unwrap_err();
        assert!(matches!(err, UpstreamError::Network { .. }));
        assert_eq!(err.url(), "http://127.0.0.1:1/data/JKT.json");
    }
}
