use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use trcguard_core::KgDocument;
use trcguard_policy::ValidationResult;
use trcguard_sql::{build_kg, explain, to_trc};

use crate::error::ApiError;
use crate::state::AppState;

/// Explanation returned when a validated statement has no TRC form.
pub const UNEXPLAINABLE: &str = "could not explain this query";

#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaRequest {
    /// SQL DDL.
    pub schema_content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub database_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub database_id: String,
    /// Natural-language request.
    pub user_query: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Empty when validation failed.
    pub sql_query: String,
    /// Empty when validation failed.
    pub trc_explanation: String,
    pub validation_status: ValidationResult,
    pub errors: Option<Vec<String>>,
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cfg.server.allowed_origins);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/submit-schema", post(submit_schema))
        .route("/api/generate-sql", post(generate_sql))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "trcguard API is running" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn submit_schema(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SchemaRequest>,
) -> Result<Json<SchemaResponse>, ApiError> {
    if request.schema_content.trim().is_empty() {
        return Err(ApiError::BadRequest("Schema content is empty".to_string()));
    }

    let kg = build_kg(&request.schema_content).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let database_id = state.store.generate_database_id();
    state.store.save(&database_id, &kg).await?;

    tracing::info!(database_id = %database_id, "Stored knowledge graph");

    Ok(Json(SchemaResponse {
        database_id,
        message: "Schema uploaded successfully".to_string(),
    }))
}

/// TRC explanation for validated SQL. A TRC failure does not fail the
/// request; the SQL is still returned with a generic explanation.
fn explanation(sql: &str, kg: &KgDocument, user_query: &str) -> String {
    match to_trc(sql, kg) {
        Ok(trc) => explain(&trc, sql, user_query),
        Err(e) => {
            tracing::warn!(error = %e, "Could not build TRC for validated SQL");
            UNEXPLAINABLE.to_string()
        }
    }
}

async fn generate_sql(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let kg = state
        .store
        .load(&request.database_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Database '{}' not found", request.database_id)))?;

    let sql = state
        .generator
        .generate(&request.user_query, &kg.table_columns())
        .await?;

    let validation = trcguard_policy::validate(&sql, &kg, &request.user_query);
    let errors: Vec<String> = validation.errors().map(str::to_string).collect();

    if !validation.overall_valid {
        tracing::warn!(
            database_id = %request.database_id,
            errors = errors.len(),
            "Generated SQL failed validation, withholding it"
        );
        return Ok(Json(QueryResponse {
            sql_query: String::new(),
            trc_explanation: String::new(),
            validation_status: validation,
            errors: Some(errors),
        }));
    }

    let trc_explanation = explanation(&sql, &kg, &request.user_query);

    Ok(Json(QueryResponse {
        sql_query: sql,
        trc_explanation,
        validation_status: validation,
        errors: None,
    }))
}
