//! Core types for the city subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A catalog entry: an opaque upstream key plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub code: String,
    pub name: String,
}

impl City {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Which stage produced a suggestion list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionReason {
    /// Raw, case-insensitive containment of the query in a city name.
    Substring,
    /// Sequence similarity at or above the cutoff.
    Similar,
}

impl fmt::Display for SuggestionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substring => write!(f, "substring"),
            Self::Similar => write!(f, "similar"),
        }
    }
}

/// Outcome of resolving a query against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found {
        city: City,
    },
    Suggestions {
        candidates: Vec<City>,
        reason: SuggestionReason,
    },
    NotFound,
}

impl Resolution {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Found { .. } => "found",
            Self::Suggestions { .. } => "suggestions",
            Self::NotFound => "not_found",
        }
    }

    /// Caller-facing message. Existing clients match on these strings.
    pub fn message(&self) -> String {
        match self {
            Self::Found { city } => format!("City '{}' found.", city.name),
            Self::Suggestions {
                reason: SuggestionReason::Substring,
                ..
            } => "City not found. Did you mean one of these?".to_string(),
            Self::Suggestions {
                reason: SuggestionReason::Similar,
                ..
            } => "City not found. Here are the closest matches.".to_string(),
            Self::NotFound => {
                "City not found. Please retype the city or try another name.".to_string()
            }
        }
    }

    pub fn city(&self) -> Option<&City> {
        match self {
            Self::Found { city } => Some(city),
            _ => None,
        }
    }

    pub fn suggestions(&self) -> &[City] {
        match self {
            Self::Suggestions { candidates, .. } => candidates,
            _ => &[],
        }
    }
}

/// Wire form of a [`Resolution`], as returned by `/cities` and in 404 bodies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityMatch {
    pub status: String,
    pub message: String,
    pub city: Option<City>,
    #[serde(default)]
    pub suggestions: Vec<City>,
}

impl From<&Resolution> for CityMatch {
    fn from(resolution: &Resolution) -> Self {
        Self {
            status: resolution.status().to_string(),
            message: resolution.message(),
            city: resolution.city().cloned(),
            suggestions: resolution.suggestions().to_vec(),
        }
    }
}

impl From<Resolution> for CityMatch {
    fn from(resolution: Resolution) -> Self {
        Self::from(&resolution)
    }
}

/// Catalog construction errors. Both are fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog unavailable at {source_name}: {reason}")]
    Unavailable { source_name: String, reason: String },

    #[error("Malformed catalog {location}: {reason} (entry: {entry})")]
    Malformed {
        location: String,
        entry: String,
        reason: String,
    },
}
