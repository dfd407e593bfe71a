//! HTTP endpoint for the web front end.
//!
//! - `POST /submit-form`: run one tide query, answer `{"message", "result"}`
//! - `GET /locations`: list catalog names for the location picker
//!
//! CORS is wide open; the front end is served from a different origin.

use crate::analysis::{AnalysisError, TideFilterEngine};
use crate::form::{FormError, SubmitForm};
use crate::solar::SunCalculator;
use crate::tide_data::TideSource;
use crate::ResultRow;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, warn};

/// Shared, read-only engine handed to every request.
pub type SharedEngine<T, S> = Arc<TideFilterEngine<T, S>>;

/// Build the router with all routes and middleware.
pub fn create_router<T, S>(engine: SharedEngine<T, S>) -> Router
where
    T: TideSource + Send + Sync + 'static,
    S: SunCalculator + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/submit-form", post(submit_form::<T, S>))
        .route("/locations", get(list_locations::<T, S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(engine)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub message: String,
    pub result: Vec<ResultRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationsResponse {
    pub locations: Vec<String>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

/// Anything a handler can fail with.
#[derive(Debug)]
pub enum AppError {
    /// Body was not JSON or did not have the form's shape
    Body(JsonRejection),
    Form(FormError),
    Analysis(AnalysisError),
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        AppError::Body(err)
    }
}

impl From<FormError> for AppError {
    fn from(err: FormError) -> Self {
        AppError::Form(err)
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::Analysis(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Body(e) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.body_text()),
            AppError::Form(e) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", e.to_string()),
            AppError::Analysis(e) => {
                let (status, code) = match &e {
                    AnalysisError::LocationNotFound(_) => {
                        (StatusCode::NOT_FOUND, "LOCATION_NOT_FOUND")
                    }
                    AnalysisError::InvalidDateFormat { .. } => {
                        (StatusCode::BAD_REQUEST, "INVALID_DATE")
                    }
                    AnalysisError::SourceUnavailable(_) => {
                        (StatusCode::BAD_GATEWAY, "TIDE_SOURCE_UNAVAILABLE")
                    }
                    AnalysisError::Computation(_) => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "SUN_COMPUTATION")
                    }
                };
                (status, code, e.to_string())
            }
        };

        if status.is_server_error() {
            error!(code, %message, "tide query failed");
        } else {
            warn!(code, %message, "tide query rejected");
        }

        let body = ApiError {
            code: code.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

async fn submit_form<T, S>(
    State(engine): State<SharedEngine<T, S>>,
    payload: Result<Json<SubmitForm>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError>
where
    T: TideSource + Send + Sync + 'static,
    S: SunCalculator + Send + Sync + 'static,
{
    let Json(form) = payload?;
    let query = form.into_query()?;
    let result = engine.analyze(&query).await?;
    Ok(Json(SubmitResponse {
        message: "Form data received".to_string(),
        result,
    }))
}

async fn list_locations<T, S>(State(engine): State<SharedEngine<T, S>>) -> Json<LocationsResponse>
where
    T: TideSource + Send + Sync + 'static,
    S: SunCalculator + Send + Sync + 'static,
{
    Json(LocationsResponse {
        locations: engine.catalog().names().map(str::to_string).collect(),
    })
}
