mod handlers;
mod state;

use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use handlers::WeatherResponse;
pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/cities", get(handlers::cities))
        .route("/weather", get(handlers::weather))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start(host: &str, port: u16, state: AppState) {
    let state = Arc::new(state);
    let app = build_router(Arc::clone(&state));
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    #[cfg(unix)]
    tokio::spawn(reload_on_hangup(Arc::clone(&state)));

    tracing::info!(
        "cuaca server listening on http://{} ({} cities)",
        addr,
        state.catalog().len()
    );

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Server error: {}", e);
            std::process::exit(1);
        });
}

/// Reload the catalog on SIGHUP. A failed reload keeps serving the old one.
#[cfg(unix)]
async fn reload_on_hangup(state: Arc<AppState>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = match signal(SignalKind::hangup()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("SIGHUP reload disabled: {}", e);
            return;
        }
    };

    while hangup.recv().await.is_some() {
        let worker = Arc::clone(&state);
        match tokio::task::spawn_blocking(move || worker.reload_catalog()).await {
            Ok(Ok(count)) => tracing::info!("Catalog reloaded ({} cities)", count),
            Ok(Err(e)) => tracing::warn!("Catalog reload failed, keeping current: {}", e),
            Err(e) => tracing::warn!("Catalog reload task failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::{Catalog, City};
    use crate::config::Settings;

    #[tokio::test]
    async fn test_router_serves_health() {
        let state = Arc::new(AppState::new(
            Catalog::new(vec![City::new("JKT", "Jakarta")]),
            Settings::default(),
        ));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        let body = tokio::task::spawn_blocking(move || {
            ureq::get(&format!("http://{}/cities?q=jakarta", addr))
                .call()
                .unwrap()
                .into_string()
                .unwrap()
        })
        .await
        .unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "found");
        assert_eq!(json["city"]["code"], "JKT");
    }

    #[tokio::test]
    async fn test_router_missing_query_is_422() {
        let state = Arc::new(AppState::new(Catalog::default(), Settings::default()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(state)).await.unwrap();
        });

        let status = tokio::task::spawn_blocking(move || {
            match ureq::get(&format!("http://{}/cities", addr)).call() {
                Err(ureq::Error::Status(code, _)) => code,
                Ok(r) => r.status(),
                Err(e) => panic!("transport error: {}", e),
            }
        })
        .await
        .unwrap();
        assert_eq!(status, 422);
    }
}
