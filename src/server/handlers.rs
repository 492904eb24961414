use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::city::{resolve, City, CityMatch, Resolution};
use crate::upstream::UpstreamError;

use super::state::AppState;

// ─── Error response ──────────────────────────────────────────────

/// Error body is `{"detail": ...}`, where detail is a string or an object.
#[derive(Debug)]
pub struct ApiError(StatusCode, Value);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "detail": self.1 }))).into_response()
    }
}

fn api_error(status: StatusCode, detail: impl Into<Value>) -> ApiError {
    ApiError(status, detail.into())
}

fn required_param<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, ApiError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(api_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Missing '{}' parameter", name),
        )),
    }
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ─── GET /cities ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct CitiesQuery {
    pub q: Option<String>,
    /// Alias accepted for callers that send `city`.
    pub city: Option<String>,
}

pub async fn cities(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CitiesQuery>,
) -> Result<Json<CityMatch>, ApiError> {
    let start = Instant::now();
    // First of `q` / `city` that carries text; a blank `q` does not shadow `city`.
    let supplied = [params.q.as_deref(), params.city.as_deref()]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty());
    let query = required_param(supplied, "q")?;

    let catalog = state.catalog();
    let resolution = resolve(&catalog, query, state.settings.suggest_limit);

    tracing::info!(
        "GET /cities?q={} -> {} ({:.1}ms)",
        query,
        resolution.status(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(CityMatch::from(resolution)))
}

// ─── GET /weather ────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub struct WeatherQuery {
    pub city: Option<String>,
    /// YYYY-MM-DD, echoed back as `date`.
    pub at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub city: City,
    pub date: Option<String>,
    pub data: Value,
}

pub async fn weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let start = Instant::now();
    let query = required_param(params.city.as_deref(), "city")?;

    if let Some(ref at) = params.at {
        NaiveDate::parse_from_str(at, "%Y-%m-%d").map_err(|e| {
            api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid date '{}': {}", at, e),
            )
        })?;
    }

    let catalog = state.catalog();
    let city = match resolve(&catalog, query, state.settings.suggest_limit) {
        Resolution::Found { city } => city,
        other => {
            tracing::info!("GET /weather?city={} -> {}", query, other.status());
            let detail = serde_json::to_value(CityMatch::from(other)).unwrap_or(Value::Null);
            return Err(api_error(StatusCode::NOT_FOUND, detail));
        }
    };

    let code = city.code.clone();
    let worker = Arc::clone(&state);
    let data = tokio::task::spawn_blocking(move || worker.upstream.weather(&worker.settings, &code))
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(upstream_error)?;

    tracing::info!(
        "GET /weather?city={} -> {} ({:.1}ms)",
        query,
        city.code,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(WeatherResponse {
        city,
        date: params.at,
        data,
    }))
}

fn upstream_error(err: UpstreamError) -> ApiError {
    let detail = match &err {
        UpstreamError::Status { url, status } => json!({
            "message": "Failed to fetch data from data-cuaca repository.",
            "status_code": status,
            "url": url,
        }),
        UpstreamError::InvalidJson { url, reason } => json!({
            "message": "Response from data-cuaca is not valid JSON.",
            "error": reason,
            "url": url,
        }),
        UpstreamError::Network { url, reason } => json!({
            "message": "Failed to reach data-cuaca repository.",
            "error": reason,
            "url": url,
        }),
    };
    api_error(StatusCode::BAD_GATEWAY, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::Catalog;
    use crate::config::Settings;
    use axum::routing::get;
    use axum::Router;

    fn state_with_base(base_url: &str) -> Arc<AppState> {
        let catalog = Catalog::new(vec![
            City::new("JKT", "Jakarta"),
            City::new("BDG", "Bandung"),
            City::new("SBY", "Surabaya"),
        ]);
        let settings = Settings {
            base_url: base_url.to_string(),
            ..Settings::default()
        };
        Arc::new(AppState::new(catalog, settings))
    }

    fn state() -> Arc<AppState> {
        state_with_base("http://127.0.0.1:1")
    }

    async fn serve_fixture() -> String {
        let router = Router::new().route(
            "/data/{file}",
            get(|axum::extract::Path(file): axum::extract::Path<String>| async move {
                match file.as_str() {
                    "JKT.json" => (StatusCode::OK, r#"{"lokasi": {"kota": "Jakarta"}}"#),
                    "BDG.json" => (StatusCode::OK, "not json"),
                    _ => (StatusCode::NOT_FOUND, "404: Not Found"),
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn cities_query(q: &str) -> Query<CitiesQuery> {
        Query(CitiesQuery {
            q: Some(q.to_string()),
            city: None,
        })
    }

    fn weather_query(city: &str, at: Option<&str>) -> Query<WeatherQuery> {
        Query(WeatherQuery {
            city: Some(city.to_string()),
            at: at.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_cities_found() {
        let Json(body) = cities(State(state()), cities_query("  JAKARTA ")).await.unwrap();
        assert_eq!(body.status, "found");
        assert_eq!(body.city, Some(City::new("JKT", "Jakarta")));
        assert!(body.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_cities_city_alias() {
        let params = Query(CitiesQuery {
            q: None,
            city: Some("ban".into()),
        });
        let Json(body) = cities(State(state()), params).await.unwrap();
        assert_eq!(body.status, "suggestions");
        assert_eq!(body.suggestions, vec![City::new("BDG", "Bandung")]);
    }

    #[tokio::test]
    async fn test_cities_blank_q_falls_back_to_city() {
        let params = Query(CitiesQuery {
            q: Some(String::new()),
            city: Some("Bandung".into()),
        });
        let Json(body) = cities(State(state()), params).await.unwrap();
        assert_eq!(body.status, "found");
        assert_eq!(body.city, Some(City::new("BDG", "Bandung")));
    }

    #[tokio::test]
    async fn test_cities_both_blank_is_unprocessable() {
        let params = Query(CitiesQuery {
            q: Some("  ".into()),
            city: Some(String::new()),
        });
        let err = cities(State(state()), params).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_cities_not_found() {
        let Json(body) = cities(State(state()), cities_query("xyzxyz")).await.unwrap();
        assert_eq!(body.status, "not_found");
        assert!(body.city.is_none());
    }

    #[tokio::test]
    async fn test_cities_missing_query() {
        let err = cities(State(state()), Query(CitiesQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        let err = cities(State(state()), cities_query("   ")).await.unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_weather_unresolved_is_404_with_match() {
        let err = weather(State(state()), weather_query("surabya", None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert_eq!(err.1["status"], "suggestions");
        assert_eq!(err.1["suggestions"][0]["code"], "SBY");
    }

    #[tokio::test]
    async fn test_weather_invalid_date() {
        let err = weather(State(state()), weather_query("Jakarta", Some("2024-13-01")))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_weather_unreachable_upstream() {
        let err = weather(State(state()), weather_query("Jakarta", None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert_eq!(err.1["message"], "Failed to reach data-cuaca repository.");
        assert_eq!(err.1["url"], "http://127.0.0.1:1/data/JKT.json");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_weather_passthrough() {
        let base = serve_fixture().await;
        let Json(body) = weather(State(state_with_base(&base)), weather_query("jakarta", Some("2025-01-31")))
            .await
            .unwrap();
        assert_eq!(body.city.code, "JKT");
        assert_eq!(body.date.as_deref(), Some("2025-01-31"));
        assert_eq!(body.data["lokasi"]["kota"], "Jakarta");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_weather_upstream_status() {
        let base = serve_fixture().await;
        let err = weather(State(state_with_base(&base)), weather_query("Surabaya", None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert_eq!(err.1["status_code"], 404);
        assert_eq!(err.1["message"], "Failed to fetch data from data-cuaca repository.");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_weather_upstream_invalid_json() {
        let base = serve_fixture().await;
        let err = weather(State(state_with_base(&base)), weather_query("Bandung", None))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_GATEWAY);
        assert_eq!(err.1["message"], "Response from data-cuaca is not valid JSON.");
    }

    #[test]
    fn test_error_body_shape() {
        let resp = api_error(StatusCode::NOT_FOUND, "nope").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
