//! API Handlers
//!
//! HTTP request handlers exposing the cache engine.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::CacheEngine;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// The engine is internally reference-counted, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub engine: CacheEngine,
}

impl AppState {
    /// Creates a new AppState around an existing engine.
    pub fn new(engine: CacheEngine) -> Self {
        Self { engine }
    }

    /// Opens the configured storage area and builds the engine over it.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(CacheEngine::from_config(config)?))
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for GET /state/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;

    let value = state
        .engine
        .try_get_state(&key)?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for PUT /state/:key
///
/// Merges the request value into the stored state and returns the result.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    check_key(&key)?;

    let options = req.options(state.engine.default_options());
    let value = state.engine.try_set_state(&key, req.value, options)?;

    Ok(Json(SetResponse::new(key, value, options.cache_timeout)))
}

/// Handler for DELETE /state/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    check_key(&key)?;
    state.engine.try_remove_state(&key)?;

    Ok(Json(DeleteResponse::removed(&key)))
}

/// Handler for DELETE /state
///
/// Clears the whole storage area.
pub async fn reset_handler(State(state): State<AppState>) -> Result<Json<DeleteResponse>> {
    state.engine.try_reset_storage()?;

    Ok(Json(DeleteResponse::cleared(state.engine.backend().area())))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let engine = &state.engine;

    Json(StatsResponse::new(
        engine.backend().area(),
        engine.encrypt(),
        &engine.stats(),
        engine.pending_expiries(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
