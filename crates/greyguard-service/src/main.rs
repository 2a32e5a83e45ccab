use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::{Json, Router};
use clap::Parser;
use greyguard_api::{
    ErrorBody, MatchRequest, MatchResponse, MatcherConfig, TrialMatcherApi, API_CONTRACT_VERSION,
};
use greyguard_core::{MatchError, TrialListing};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

const SERVICE_CONTRACT_VERSION: &str = "service.v1";
const OPENAPI_YAML: &str = include_str!("../../../openapi/openapi.yaml");
const INVALID_BODY: &str = "Invalid request body";
const METHOD_NOT_ALLOWED: &str = "Method not allowed";

#[derive(Debug, Clone)]
struct ServiceState {
    api: TrialMatcherApi,
    ai_provider_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceEnvelope<T>
where
    T: Serialize,
{
    service_contract_version: &'static str,
    api_contract_version: &'static str,
    data: T,
}

#[derive(Debug, Clone)]
struct ServiceError {
    status: StatusCode,
    body: ErrorBody,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    catalog_size: usize,
    ai_provider_configured: bool,
}

#[derive(Debug, Parser)]
#[command(name = "greyguard-service")]
#[command(about = "HTTP service for GreyGuard trial matching")]
struct Args {
    #[arg(long, env = "GREYGUARD_BIND", default_value = "127.0.0.1:4020")]
    bind: SocketAddr,
    /// JSON catalog to serve instead of the built-in trials.
    #[arg(long, env = "GREYGUARD_CATALOG")]
    catalog: Option<PathBuf>,
    /// Artificial delay applied to every match request, in milliseconds.
    #[arg(long, env = "GREYGUARD_LATENCY_MS", default_value_t = 0)]
    latency_ms: u64,
    /// Upstream AI provider key. Only its presence is reported.
    #[arg(long, env = "GREYGUARD_AI_API_KEY", hide_env_values = true)]
    ai_api_key: Option<String>,
    #[arg(long, env = "GREYGUARD_LOG", default_value = "info")]
    log: String,
}

impl ServiceError {
    fn new(status: StatusCode, body: ErrorBody) -> Self {
        Self { status, body }
    }
}

impl From<MatchError> for ServiceError {
    fn from(err: MatchError) -> Self {
        let status = match &err {
            MatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            MatchError::TrialNotFound(_) => StatusCode::NOT_FOUND,
            MatchError::CatalogInvalid(_) | MatchError::Internal(_) => {
                tracing::error!(error = %err, "trial matching failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self::new(status, ErrorBody::from(&err))
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn envelope<T>(data: T) -> ServiceEnvelope<T>
where
    T: Serialize,
{
    ServiceEnvelope {
        service_contract_version: SERVICE_CONTRACT_VERSION,
        api_contract_version: API_CONTRACT_VERSION,
        data,
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

fn matcher_route() -> MethodRouter<ServiceState> {
    post(match_trials).options(preflight).fallback(method_not_allowed)
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/openapi", get(openapi))
        .route("/v1/trials", get(list_trials))
        .route("/v1/trials/:trial_id", get(show_trial))
        .route("/v1/match", matcher_route())
        .route("/api/trial-matcher", matcher_route())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&args.log)).init();

    let api = TrialMatcherApi::load(
        args.catalog.as_deref(),
        MatcherConfig::with_latency_ms(args.latency_ms),
    )?;
    let state = ServiceState {
        api,
        ai_provider_configured: args.ai_api_key.as_deref().is_some_and(|key| !key.trim().is_empty()),
    };

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(
        addr = %args.bind,
        trials = state.api.catalog().len(),
        latency_ms = args.latency_ms,
        "starting GreyGuard trial matcher"
    );
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn health(State(state): State<ServiceState>) -> Json<ServiceEnvelope<HealthResponse>> {
    Json(envelope(HealthResponse {
        status: "ok",
        catalog_size: state.api.catalog().len(),
        ai_provider_configured: state.ai_provider_configured,
    }))
}

async fn openapi() -> impl IntoResponse {
    (StatusCode::OK, [("content-type", "application/yaml; charset=utf-8")], OPENAPI_YAML)
}

async fn list_trials(State(state): State<ServiceState>) -> Json<ServiceEnvelope<Vec<TrialListing>>> {
    Json(envelope(state.api.list_trials()))
}

async fn show_trial(
    State(state): State<ServiceState>,
    Path(trial_id): Path<String>,
) -> Result<Json<ServiceEnvelope<TrialListing>>, ServiceError> {
    let listing = state.api.get_trial(&trial_id)?;
    Ok(Json(envelope(listing)))
}

async fn match_trials(
    State(state): State<ServiceState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, ServiceError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "unreadable match request body");
        ServiceError::new(
            StatusCode::BAD_REQUEST,
            ErrorBody::new(INVALID_BODY, Some(rejection.body_text())),
        )
    })?;

    let latency = state.api.config().artificial_latency;
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }

    let response = state.api.match_trials(request)?;
    Ok(Json(response))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ServiceError {
    ServiceError::new(StatusCode::METHOD_NOT_ALLOWED, ErrorBody::new(METHOD_NOT_ALLOWED, None))
}
