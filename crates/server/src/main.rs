use std::{any::Any, net::SocketAddr, sync::Arc};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use server_api::{
    create_movie, delete_movie, list_movies, movie_not_found, update_movie, ApiContext,
};
use shared::{
    domain::{Movie, MovieId},
    error::{ApiError, ErrorCode},
    protocol::{CreateMovieResponse, MessageResponse, MovieInput},
};
use storage::Storage;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::{load_settings, prepare_database_url};

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const INVALID_JSON_DETAIL: &str = "request body must be a JSON object";

type HttpError = (StatusCode, Json<ApiError>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            error = %format!("{error:#}"),
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;
    let year_bounds = settings.year_bounds();
    let api = ApiContext {
        storage: storage.clone(),
        year_bounds,
    };
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        %database_url,
        min_year = year_bounds.min,
        max_year = year_bounds.max,
        "movie catalog listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    storage.close().await;
    info!("storage closed, bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for ctrl-c; shutting down");
    }
    info!("shutdown requested");
}

fn build_router(state: Arc<AppState>) -> Router {
    with_middleware(routes().with_state(state))
}

fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/movies",
            get(http_list_movies)
                .post(http_create_movie)
                .fallback(endpoint_not_found),
        )
        .route(
            "/movies/:movie_id",
            put(http_update_movie)
                .delete(http_delete_movie)
                .fallback(endpoint_not_found),
        )
        .fallback(endpoint_not_found)
}

fn with_middleware(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn(json_payload_too_large))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn http_error(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(%detail, "handler panicked");
    http_error(ApiError::internal("Internal server error")).into_response()
}

fn payload_too_large() -> HttpError {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(ApiError::new(ErrorCode::Validation, "Request body too large")),
    )
}

/// The body limit layer answers oversized requests with plain text; every
/// failure leaving the service carries an `ApiError` body instead.
async fn json_payload_too_large(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(limit = MAX_BODY_BYTES, "request body too large");
        return payload_too_large().into_response();
    }
    response
}

async fn endpoint_not_found() -> HttpError {
    http_error(ApiError::not_found("Endpoint not found"))
}

async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    state.api.storage.health_check().await.map_err(|e| {
        error!(error = %format!("{e:#}"), "health check failed");
        http_error(ApiError::internal("Storage unavailable"))
    })?;
    Ok("ok")
}

/// Path ids that are not integers cannot name a stored movie.
fn parse_movie_id(raw: &str) -> Result<MovieId, HttpError> {
    raw.trim()
        .parse::<i64>()
        .map(MovieId)
        .map_err(|_| http_error(movie_not_found()))
}

fn json_body(payload: Result<Json<MovieInput>, JsonRejection>) -> Result<MovieInput, HttpError> {
    match payload {
        Ok(Json(input)) => Ok(input),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(payload_too_large())
        }
        Err(rejection) => {
            warn!(reason = %rejection.body_text(), "rejected request body");
            let mut err = ApiError::validation(vec![INVALID_JSON_DETAIL.to_string()]);
            err.error = "Invalid JSON body".into();
            Err(http_error(err))
        }
    }
}

async fn http_list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Movie>>, HttpError> {
    info!("GET /movies");
    list_movies(&state.api).await.map(Json).map_err(http_error)
}

async fn http_create_movie(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<MovieInput>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateMovieResponse>), HttpError> {
    info!("POST /movies");
    let input = json_body(payload)?;
    let created = create_movie(&state.api, &input).await.map_err(http_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn http_update_movie(
    State(state): State<Arc<AppState>>,
    Path(raw_movie_id): Path<String>,
    payload: Result<Json<MovieInput>, JsonRejection>,
) -> Result<Json<MessageResponse>, HttpError> {
    info!(movie_id = %raw_movie_id, "PUT /movies/:movie_id");
    let movie_id = parse_movie_id(&raw_movie_id)?;
    let input = json_body(payload)?;
    update_movie(&state.api, movie_id, &input)
        .await
        .map(Json)
        .map_err(http_error)
}

async fn http_delete_movie(
    State(state): State<Arc<AppState>>,
    Path(raw_movie_id): Path<String>,
) -> Result<Json<MessageResponse>, HttpError> {
    info!(movie_id = %raw_movie_id, "DELETE /movies/:movie_id");
    let movie_id = parse_movie_id(&raw_movie_id)?;
    delete_movie(&state.api, movie_id)
        .await
        .map(Json)
        .map_err(http_error)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
