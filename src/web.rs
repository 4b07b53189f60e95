use crate::advisor::ModelStatus;
use crate::api_errors::AppError;
use crate::app_state::AppState;
use crate::crop_catalog::CropProfile;
use crate::features::{FeatureBounds, FeatureField, FEATURE_BOUNDS};
use crate::input_validator::{raw_input_from_pairs, RawInput};
use crate::model_bundle::ArtifactDigest;
use crate::recommendation::RecommendationResult;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub const EXAMPLE_GET: &str =
    "/api/recommend?N=90&P=40&K=40&temperature=21.5&humidity=82&ph=6.5&rainfall=202";

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TimestampedRecommendation {
    #[serde(flatten)]
    pub result: RecommendationResult,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    pub model_status: ModelStatus,
    pub started_at: String,
}

#[derive(Debug, Serialize)]
pub struct CropsData {
    pub crops: Vec<String>,
    pub crop_info: BTreeMap<String, CropProfile>,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub total_crops: usize,
    pub crops: Vec<String>,
    pub model_type: Option<String>,
    pub model_status: ModelStatus,
    pub classes: Vec<String>,
    pub features: Vec<&'static str>,
    pub feature_ranges: &'static [FeatureBounds],
    pub artifacts: Vec<ArtifactDigest>,
}

/// Routes of the recommendation API, with CORS and request tracing applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/recommend", get(recommend_query).post(recommend_json))
        // alias tolerated for clients that post to the singular noun
        .route("/api/recommendation", post(recommend_json))
        .route("/api/crops", get(list_crops))
        .route("/api/stats", get(stats))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(
            ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
        )
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Crop advisor API listening on http://{addr}");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        success: true,
        message: "Crop Recommendation API is running".to_string(),
        timestamp: Utc::now().to_rfc3339(),
        model_status: state.advisor.model_status(),
        started_at: state.started_at.to_rfc3339(),
    })
}

async fn recommend_json(
    State(state): State<AppState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<ApiResponse<TimestampedRecommendation>>, AppError> {
    let Json(value) = body.map_err(|e| AppError::bad_request(format!("Invalid JSON body: {e}")))?;
    // a non-object body carries none of the required fields
    let raw: RawInput = value.as_object().cloned().unwrap_or_default();
    run_recommendation(&state, &raw)
}

async fn recommend_query(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, AppError> {
    if params.is_empty() {
        let usage = serde_json::json!({
            "success": false,
            "error": "Provide parameters via POST JSON body or GET query string. Example:",
            "example_get": EXAMPLE_GET,
        });
        return Ok((StatusCode::OK, Json(usage)).into_response());
    }
    let raw = raw_input_from_pairs(&params);
    Ok(run_recommendation(&state, &raw)?.into_response())
}

fn run_recommendation(
    state: &AppState,
    raw: &RawInput,
) -> Result<Json<ApiResponse<TimestampedRecommendation>>, AppError> {
    let result = state.advisor.recommend(raw)?;
    Ok(ApiResponse::ok(TimestampedRecommendation {
        result,
        timestamp: Utc::now().to_rfc3339(),
    }))
}

async fn list_crops(State(state): State<AppState>) -> Json<ApiResponse<CropsData>> {
    let catalog = state.advisor.catalog();
    ApiResponse::ok(CropsData {
        crops: catalog.names().to_vec(),
        crop_info: catalog
            .iter()
            .map(|(name, profile)| (name.to_string(), profile.clone()))
            .collect(),
    })
}

async fn stats(State(state): State<AppState>) -> Result<Json<ApiResponse<StatsData>>, AppError> {
    let advisor = &state.advisor;
    let bundle = advisor.engine().bundle().ok();
    let classes = match bundle {
        Some(b) => b.labels()?,
        None => Vec::new(),
    };
    Ok(ApiResponse::ok(StatsData {
        total_crops: advisor.catalog().len(),
        crops: advisor.catalog().names().to_vec(),
        model_type: bundle.map(|b| b.model_type().to_string()),
        model_status: advisor.model_status(),
        classes,
        features: FeatureField::ALL.iter().map(|f| f.key()).collect(),
        feature_ranges: &FEATURE_BOUNDS,
        artifacts: bundle.map(|b| b.digests().to_vec()).unwrap_or_default(),
    }))
}

async fn not_found() -> AppError {
    AppError::not_found("Endpoint not found")
}

async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed("Method not allowed")
}
