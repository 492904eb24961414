use std::sync::{Arc, RwLock};

use crate::city::{Catalog, CatalogError};
use crate::config::Settings;
use crate::upstream::Upstream;

/// Shared server state.
///
/// The catalog is published as a whole `Arc`; handlers take a snapshot and
/// never see a catalog and index from different loads.
pub struct AppState {
    catalog: RwLock<Arc<Catalog>>,
    pub settings: Settings,
    pub upstream: Upstream,
}

impl AppState {
    pub fn new(catalog: Catalog, settings: Settings) -> Self {
        let upstream = Upstream::from_settings(&settings);
        Self {
            catalog: RwLock::new(Arc::new(catalog)),
            settings,
            upstream,
        }
    }

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Arc<Catalog> {
        let guard = self.catalog.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Publish a new catalog, returning the one it replaced.
    pub fn replace_catalog(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut guard = self.catalog.write().unwrap_or_else(|e| e.into_inner());
        std::mem::replace(&mut *guard, Arc::new(catalog))
    }

    /// Load the configured source again and publish it. On failure the
    /// current catalog stays in place.
    pub fn reload_catalog(&self) -> Result<usize, CatalogError> {
        let catalog = self.settings.cities.load()?;
        let count = catalog.len();
        self.replace_catalog(catalog);
        Ok(count)
    }
}
