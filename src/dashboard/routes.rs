//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::engine::runner::{CycleRequest, CycleRun, CycleRunner};
use crate::types::{CycleError, Leg, OfficialRate, Pair, QuoteBook};
use crate::venues::{catalog, VenueSelection};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub runner: CycleRunner,
    /// Held for the duration of a calculation; one run at a time.
    pub(crate) run_lock: Mutex<()>,
    pub last: RwLock<Option<LastOutcome>>,
}

impl DashboardState {
    pub fn new(runner: CycleRunner) -> Self {
        Self {
            runner,
            run_lock: Mutex::new(()),
            last: RwLock::new(None),
        }
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Outcome of the most recent run. A failure replaces any earlier result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LastOutcome {
    Result(CycleRun),
    Error(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leg: Option<Leg>,
}

impl From<&CycleError> for ErrorBody {
    fn from(e: &CycleError) -> Self {
        Self {
            error: e.to_string(),
            kind: e.kind(),
            leg: e.leg(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VenueCatalog {
    pub catalog: &'static [&'static str],
    pub enabled: VenueSelection,
}

#[derive(Debug, Clone, Serialize)]
pub struct VenuesResponse {
    pub usdt_usd: VenueCatalog,
    pub usdt_ars: VenueCatalog,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures surfaced by the API.
#[derive(Debug)]
pub enum ApiError {
    Cycle(CycleError),
    /// A calculation is already in flight.
    Busy,
    NotFound(String),
    BadRequest(String),
}

impl From<CycleError> for ApiError {
    fn from(e: CycleError) -> Self {
        ApiError::Cycle(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Cycle(e) => {
                let status = match e {
                    CycleError::Transport { .. } => StatusCode::BAD_GATEWAY,
                    CycleError::NoEligibleQuote { .. } | CycleError::InvalidLegInput { .. } => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                };
                (status, ErrorBody::from(&e))
            }
            ApiError::Busy => (
                StatusCode::CONFLICT,
                ErrorBody {
                    error: "a calculation is already running".to_string(),
                    kind: "busy",
                    leg: None,
                },
            ),
            ApiError::NotFound(error) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error,
                    kind: "not_found",
                    leg: None,
                },
            ),
            ApiError::BadRequest(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    kind: "bad_request",
                    leg: None,
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// POST /api/cycle
pub async fn post_cycle(
    State(state): State<AppState>,
    Json(request): Json<CycleRequest>,
) -> Result<Json<CycleRun>, ApiError> {
    let _guard = state.run_lock.try_lock().map_err(|_| {
        warn!("Rejecting calculation request, another run is in flight");
        ApiError::Busy
    })?;

    let outcome = state.runner.run(&request).await;
    let mut last = state.last.write().await;
    match outcome {
        Ok(run) => {
            *last = Some(LastOutcome::Result(run.clone()));
            Ok(Json(run))
        }
        Err(e) => {
            *last = Some(LastOutcome::Error(ErrorBody::from(&e)));
            Err(e.into())
        }
    }
}

/// GET /api/cycle/last
pub async fn get_last(State(state): State<AppState>) -> Result<Json<LastOutcome>, ApiError> {
    state
        .last
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("no calculation has run yet".to_string()))
}

/// GET /api/venues
pub async fn get_venues(State(state): State<AppState>) -> Json<VenuesResponse> {
    let defaults = state.runner.defaults();
    Json(VenuesResponse {
        usdt_usd: VenueCatalog {
            catalog: catalog(Pair::UsdtUsd),
            enabled: defaults.usdt_usd.clone(),
        },
        usdt_ars: VenueCatalog {
            catalog: catalog(Pair::UsdtArs),
            enabled: defaults.usdt_ars.clone(),
        },
    })
}

/// GET /api/quotes/:pair
pub async fn get_quotes(
    State(state): State<AppState>,
    Path(pair): Path<String>,
) -> Result<Json<QuoteBook>, ApiError> {
    let pair: Pair = pair
        .parse()
        .map_err(|e: anyhow::Error| ApiError::BadRequest(e.to_string()))?;
    debug!(pair = %pair, "Raw quotes requested");
    Ok(Json(state.runner.fetch_quotes(pair).await?))
}

/// GET /api/official-rate
pub async fn get_official_rate(
    State(state): State<AppState>,
) -> Result<Json<OfficialRate>, ApiError> {
    Ok(Json(state.runner.fetch_official_rate().await?))
}

/// GET /health
pub async fn health() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
