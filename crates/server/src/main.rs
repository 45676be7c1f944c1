use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use server_api::{get_counter, update_counter, ApiContext};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{CounterPayload, UpdateCounterRequest},
};
use storage::Storage;
use tracing::{error, info};

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Clone)]
struct AppState {
    api: ApiContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let api = ApiContext { storage };

    let state = AppState { api };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "counter server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/counter", get(http_get_counter).post(http_update_counter))
        .with_state(state)
}

async fn healthz(
    State(state): State<Arc<AppState>>,
) -> Result<&'static str, (StatusCode, Json<ApiError>)> {
    state.api.storage.health_check().await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError::new(ErrorCode::Storage, e.to_string())),
        )
    })?;
    Ok("ok")
}

async fn http_get_counter(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CounterPayload>, (StatusCode, Json<ApiError>)> {
    let counter = get_counter(&state.api).await.map_err(error_response)?;
    Ok(Json(counter))
}

async fn http_update_counter(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdateCounterRequest>,
) -> Result<Json<CounterPayload>, (StatusCode, Json<ApiError>)> {
    let counter = update_counter(&state.api, req.operation)
        .await
        .map_err(error_response)?;
    Ok(Json(counter))
}

fn error_response(err: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
