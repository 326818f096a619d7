//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::domain::{DomainError, TravelMode};
use crate::overpass::{CancelToken, OverpassError, QueryExecutor};
use crate::render::FailureHint;

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
///
/// Every response, errors included, carries permissive CORS headers.
pub fn create_router<E: QueryExecutor>(state: AppState<E>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/routes", get(search_routes::<E>))
        .route("/api/routes/relation/:id/stops", get(relation_stops::<E>))
        .route("/api/routes/relation/:id/geometry", get(relation_geometry::<E>))
        .route("/api/routes/way/:id/geometry", get(way_geometry::<E>))
        .route(
            "/api/routes/synthetic/:mode/geometry",
            get(synthetic_geometry::<E>),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Check if request accepts HTML.
fn accepts_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Search an area for routes of every mode.
async fn search_routes<E: QueryExecutor>(
    State(state): State<AppState<E>>,
    headers: HeaderMap,
    query: Result<Query<BboxQuery>, QueryRejection>,
) -> Result<Response, AppError> {
    let Query(bbox) = query?;
    let area = bbox.area()?;
    let outcome = state.search.search(area, &CancelToken::new()).await?;

    if accepts_html(&headers) {
        let template = RouteListTemplate::from_outcome(&outcome, state.search.config().list_limit);
        return Ok(Html(
            template
                .render()
                .unwrap_or_else(|e| format!("Template error: {}", e)),
        )
        .into_response());
    }

    Ok(Json(SearchResponse::from_outcome(&outcome)).into_response())
}

/// Stops of a public-transport relation.
async fn relation_stops<E: QueryExecutor>(
    State(state): State<AppState<E>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<StopsResponse>, AppError> {
    let Path(relation_id) = path?;
    let stops = state
        .search
        .fetch_ordered_stops(relation_id, &CancelToken::new())
        .await?;
    Ok(Json(StopsResponse::new(relation_id, &stops)))
}

async fn relation_geometry<E: QueryExecutor>(
    State(state): State<AppState<E>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<GeometryResponse>, AppError> {
    let Path(relation_id) = path?;
    let geometry = state
        .search
        .geometry()
        .relation_geometry(relation_id, &CancelToken::new())
        .await?;
    Ok(Json(geometry.into()))
}

async fn way_geometry<E: QueryExecutor>(
    State(state): State<AppState<E>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<GeometryResponse>, AppError> {
    let Path(way_id) = path?;
    let geometry = state
        .search
        .geometry()
        .way_geometry(way_id, &CancelToken::new())
        .await?;
    Ok(Json(geometry.into()))
}

/// Untagged paths of a mode inside an area.
async fn synthetic_geometry<E: QueryExecutor>(
    State(state): State<AppState<E>>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<BboxQuery>, QueryRejection>,
) -> Result<Json<GeometryResponse>, AppError> {
    let Path(mode) = path?;
    let Query(bbox) = query?;
    let mode = TravelMode::parse(&mode)?;
    if mode.synthetic_route().is_none() {
        return Err(AppError::BadRequest {
            message: format!("{mode} has no synthetic routes"),
        });
    }
    let area = bbox.area()?;
    let geometry = state
        .search
        .geometry()
        .synthetic_geometry(mode, area, &CancelToken::new())
        .await?;
    Ok(Json(geometry.into()))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Upstream(OverpassError),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

impl From<OverpassError> for AppError {
    fn from(e: OverpassError) -> Self {
        AppError::Upstream(e)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Upstream(OverpassError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Upstream(e) if e.is_rate_limited() || e.status() == Some(504) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest { .. } => "bad_request",
            AppError::Upstream(OverpassError::Timeout { .. }) => "overpass_timeout",
            AppError::Upstream(OverpassError::Status { .. }) => "overpass_status",
            AppError::Upstream(OverpassError::Parse { .. }) => "overpass_parse",
            AppError::Upstream(OverpassError::Transport { .. }) => "overpass_transport",
            AppError::Upstream(OverpassError::Cancelled) => "cancelled",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, hint) = match &self {
            AppError::BadRequest { message } => (message.clone(), None),
            AppError::Upstream(e) => (e.to_string(), Some(FailureHint::from_error(e).message())),
        };

        warn!(status = status.as_u16(), kind = self.kind(), %message, "request failed");

        let body = Json(ErrorResponse {
            error: self.kind(),
            status: status.as_u16(),
            message,
            hint,
        });
        (status, body).into_response()
    }
}
