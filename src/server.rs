use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tracing::Instrument;
use uuid::Uuid;

use crate::api::query_dto::QueryParamsDto;
use crate::api::response_dto::ErrorResponseDto;
use crate::domain::query_spec::{QuerySpec, parse_identifier};
use crate::domain::resource::ResourceKind;
use crate::domain::translator::QueryTranslator;
use crate::error::{Error, Result};

type PathSegments = HashMap<String, String>;

#[derive(Debug, Clone)]
pub struct AppState {
    translator: Arc<QueryTranslator>,
}

/// Routing table of the REST API.
pub fn router(translator: QueryTranslator) -> Router {
    let state = AppState { translator: Arc::new(translator) };

    Router::new()
        .route("/v1/jobs", get(jobs_index))
        .route("/v1/jobs/{clusterid}", get(jobs_by_path))
        .route("/v1/jobs/{clusterid}/{procid}", get(jobs_by_path))
        .route("/v1/jobs/{clusterid}/{procid}/{attribute}", get(jobs_by_path))
        .route("/v1/history", get(history_index))
        .route("/v1/history/{clusterid}", get(history_by_path))
        .route("/v1/history/{clusterid}/{procid}", get(history_by_path))
        .route("/v1/history/{clusterid}/{procid}/{attribute}", get(history_by_path))
        .route("/v1/status", get(status_index))
        .route("/v1/status/{name}", get(status_by_path))
        .route("/v1/status/{name}/{attribute}", get(status_by_path))
        .route("/v1/config", get(config_index))
        .route("/v1/config/{attribute}", get(config_by_path))
        .with_state(state)
}

/// Binds `bind_address` and serves the API until Ctrl-C or SIGTERM.
pub async fn serve(bind_address: &str, translator: QueryTranslator) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    log::info!("Listening on http://{} ({} backend)", listener.local_addr()?, translator.backend_name());

    axum::serve(listener, router(translator)).with_graceful_shutdown(shutdown_signal()).await?;

    log::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => log::info!("Received SIGTERM"),
                    _ = tokio::signal::ctrl_c() => log::info!("Received Ctrl+C"),
                }
            }
            Err(e) => {
                log::error!("Failed to register SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
                log::info!("Received Ctrl+C");
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("Received Ctrl+C");
    }
}

type QueryResult = std::result::Result<Query<QueryParamsDto>, QueryRejection>;
type PathResult = std::result::Result<Path<PathSegments>, PathRejection>;

async fn jobs_index(State(state): State<AppState>, query: QueryResult) -> Response {
    respond(&state, ResourceKind::Jobs, || job_spec(ResourceKind::Jobs, &PathSegments::new(), &query_params(query)?)).await
}

async fn jobs_by_path(State(state): State<AppState>, path: PathResult, query: QueryResult) -> Response {
    respond(&state, ResourceKind::Jobs, || job_spec(ResourceKind::Jobs, &path_segments(path)?, &query_params(query)?)).await
}

async fn history_index(State(state): State<AppState>, query: QueryResult) -> Response {
    respond(&state, ResourceKind::History, || job_spec(ResourceKind::History, &PathSegments::new(), &query_params(query)?)).await
}

async fn history_by_path(State(state): State<AppState>, path: PathResult, query: QueryResult) -> Response {
    respond(&state, ResourceKind::History, || job_spec(ResourceKind::History, &path_segments(path)?, &query_params(query)?)).await
}

async fn status_index(State(state): State<AppState>, query: QueryResult) -> Response {
    respond(&state, ResourceKind::Status, || QuerySpec::status(None, None, &query_params(query)?)).await
}

async fn status_by_path(State(state): State<AppState>, path: PathResult, query: QueryResult) -> Response {
    respond(&state, ResourceKind::Status, || {
        let segments = path_segments(path)?;
        QuerySpec::status(segment(&segments, "name"), segment(&segments, "attribute"), &query_params(query)?)
    })
    .await
}

async fn config_index(State(state): State<AppState>, query: QueryResult) -> Response {
    respond(&state, ResourceKind::Config, || QuerySpec::config(None, &query_params(query)?)).await
}

async fn config_by_path(State(state): State<AppState>, path: PathResult, query: QueryResult) -> Response {
    respond(&state, ResourceKind::Config, || QuerySpec::config(segment(&path_segments(path)?, "attribute"), &query_params(query)?)).await
}

// Extractor rejections are reported like every other invalid request.
fn query_params(query: QueryResult) -> Result<QueryParamsDto> {
    query.map(|Query(params)| params).map_err(|rejection| Error::InvalidArgument(rejection.body_text()))
}

fn path_segments(path: PathResult) -> Result<PathSegments> {
    path.map(|Path(segments)| segments).map_err(|rejection| Error::InvalidArgument(rejection.body_text()))
}

fn segment<'a>(segments: &'a PathSegments, key: &str) -> Option<&'a str> {
    segments.get(key).map(String::as_str)
}

fn job_spec(kind: ResourceKind, segments: &PathSegments, params: &QueryParamsDto) -> Result<QuerySpec> {
    let cluster_id = segment(segments, "clusterid").map(|raw| parse_identifier("clusterid", raw)).transpose()?;
    let proc_id = segment(segments, "procid").map(|raw| parse_identifier("procid", raw)).transpose()?;

    QuerySpec::jobs(kind, cluster_id, proc_id, segment(segments, "attribute"), params)
}

async fn respond(state: &AppState, kind: ResourceKind, build_spec: impl FnOnce() -> Result<QuerySpec>) -> Response {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("request", %request_id, resource = %kind);

    let result = async {
        let spec = build_spec()?;
        log::debug!("[{}] {:?}", request_id, spec);
        state.translator.translate(&spec).await
    }
    .instrument(span)
    .await;

    let mut response = match result {
        Ok(body) => {
            log::info!("[{}] GET {} -> 200", request_id, kind);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(err) => {
            log::warn!("[{}] GET {} -> {}: {}", request_id, kind, err.status_code(), err);
            err.into_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponseDto { message: self.to_string() })).into_response()
    }
}
