//! The immutable city catalog and its loader.
//!
//! A catalog is built once from a JSON array of `{code, name}` objects read
//! from a local file or an HTTP(S) URL. Any unreadable source or bad entry
//! rejects the whole document; there is no partial catalog.

use super::normalize::normalize;
use super::types::{CatalogError, City};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Ordered, read-only set of cities with a normalized-name index.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cities: Vec<City>,
    /// normalized name -> position in `cities`; first occurrence wins.
    index: HashMap<String, usize>,
    /// Distinct normalized names in first-occurrence order.
    names: Vec<String>,
}

impl Catalog {
    pub fn new(cities: Vec<City>) -> Self {
        let mut index = HashMap::with_capacity(cities.len());
        let mut names = Vec::with_capacity(cities.len());
        for (pos, city) in cities.iter().enumerate() {
            let key = normalize(&city.name);
            if !index.contains_key(&key) {
                index.insert(key.clone(), pos);
                names.push(key);
            }
        }
        Self {
            cities,
            index,
            names,
        }
    }

    /// Decode and validate an already-fetched catalog document.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        let (_, cities) = parse_document(text)?;
        Ok(Self::new(cities))
    }

    pub fn all(&self) -> &[City] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Exact lookup by an already-normalized name.
    pub fn lookup(&self, normalized: &str) -> Option<&City> {
        self.index.get(normalized).map(|&pos| &self.cities[pos])
    }

    /// Distinct normalized names paired with their city, in catalog order.
    pub fn normalized_entries(&self) -> impl Iterator<Item = (&str, &City)> {
        self.names
            .iter()
            .filter_map(|name| self.lookup(name).map(|city| (name.as_str(), city)))
    }
}

// ─── Sources ─────────────────────────────────────────────────────

/// Where the catalog document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Url(String),
}

impl CatalogSource {
    /// `http://` and `https://` strings are URLs; anything else is a path.
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            Self::Url(raw.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }

    /// Read the raw document text.
    pub fn read(&self) -> Result<String, CatalogError> {
        match self {
            Self::File(path) => fs::read_to_string(path).map_err(|e| {
                let reason = if e.kind() == std::io::ErrorKind::NotFound {
                    "file does not exist; refresh it with `cuaca update-cities`".to_string()
                } else {
                    e.to_string()
                };
                CatalogError::Unavailable {
                    source_name: self.to_string(),
                    reason,
                }
            }),
            Self::Url(url) => {
                let unavailable = |reason: String| CatalogError::Unavailable {
                    source_name: url.clone(),
                    reason,
                };
                let response = ureq::get(url)
                    .timeout(FETCH_TIMEOUT)
                    .call()
                    .map_err(|e| unavailable(e.to_string()))?;
                response.into_string().map_err(|e| unavailable(e.to_string()))
            }
        }
    }

    /// Read, decode and validate the whole catalog.
    pub fn load(&self) -> Result<Catalog, CatalogError> {
        let text = self.read()?;
        let catalog = Catalog::from_json_str(&text)?;
        tracing::info!("Loaded {} cities from {}", catalog.len(), self);
        Ok(catalog)
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{}", url),
        }
    }
}

// ─── Validation ──────────────────────────────────────────────────

/// Parse a catalog document, returning the raw JSON alongside the cities.
///
/// The raw value is kept so that `update-cities` can write the document back
/// without dropping fields this crate does not model.
pub fn parse_document(text: &str) -> Result<(Value, Vec<City>), CatalogError> {
    let payload: Value = serde_json::from_str(text).map_err(|e| CatalogError::Malformed {
        location: "document".into(),
        entry: truncate(text, 80),
        reason: format!("invalid JSON: {}", e),
    })?;

    let entries = payload.as_array().ok_or_else(|| CatalogError::Malformed {
        location: "document".into(),
        entry: truncate(&payload.to_string(), 80),
        reason: "expected a JSON array of {code, name} objects".into(),
    })?;

    let cities = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| city_from_entry(i, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((payload, cities))
}

fn city_from_entry(index: usize, entry: &Value) -> Result<City, CatalogError> {
    let malformed = |reason: &str| CatalogError::Malformed {
        location: format!("entry #{}", index),
        entry: entry.to_string(),
        reason: reason.to_string(),
    };

    let obj = entry.as_object().ok_or_else(|| malformed("not an object"))?;
    let code = obj
        .get("code")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing string field 'code'"))?;
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("missing string field 'name'"))?;

    Ok(City::new(code, name))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    }
}
