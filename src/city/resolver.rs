//! City name resolver.
//!
//! Stages, each tried only when the previous one produced nothing:
//! exact normalized name → raw case-insensitive substring → similarity ranking.

use super::catalog::Catalog;
use super::normalize::normalize;
use super::similarity::{close_ratio, SIMILARITY_CUTOFF};
use super::types::{City, Resolution, SuggestionReason};
use std::collections::HashSet;

/// Resolve `query` against `catalog`, returning at most `limit` suggestions.
///
/// `query` must not be empty or whitespace-only; callers validate that at the
/// boundary. Never fails and never mutates the catalog.
pub fn resolve(catalog: &Catalog, query: &str, limit: usize) -> Resolution {
    let normalized = normalize(query);

    // 1. Exact normalized match
    if let Some(city) = catalog.lookup(&normalized) {
        tracing::debug!("resolve '{}': exact match {}", query, city.code);
        return Resolution::Found { city: city.clone() };
    }

    // 2. Raw substring match. Punctuation in the query still counts here.
    let needle = query.to_lowercase();
    let contained: Vec<&City> = catalog
        .all()
        .iter()
        .filter(|city| city.name.to_lowercase().contains(&needle))
        .collect();
    if !contained.is_empty() {
        tracing::debug!(
            "resolve '{}': {} {} matches",
            query,
            contained.len(),
            SuggestionReason::Substring
        );
        return Resolution::Suggestions {
            candidates: take_distinct(contained, limit),
            reason: SuggestionReason::Substring,
        };
    }

    // 3. Similarity ranking over normalized names
    let mut scored: Vec<(f64, &City)> = catalog
        .normalized_entries()
        .filter_map(|(name, city)| {
            close_ratio(name, &normalized, SIMILARITY_CUTOFF).map(|score| (score, city))
        })
        .collect();
    // Stable: equal scores keep catalog order.
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let candidates = take_distinct(scored.into_iter().map(|(_, city)| city), limit);
    tracing::debug!(
        "resolve '{}': {} {} candidates",
        query,
        candidates.len(),
        SuggestionReason::Similar
    );

    if candidates.is_empty() {
        Resolution::NotFound
    } else {
        Resolution::Suggestions {
            candidates,
            reason: SuggestionReason::Similar,
        }
    }
}

/// First `limit` cities in order, skipping repeated codes.
fn take_distinct<'a>(cities: impl IntoIterator<Item = &'a City>, limit: usize) -> Vec<City> {
    let mut seen = HashSet::new();
    cities
        .into_iter()
        .filter(|city| seen.insert(city.code.as_str()))
        .take(limit)
        .cloned()
        .collect()
}
