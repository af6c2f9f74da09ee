//! HTTP inbound adapter.
//!
//! Serves the management page, the add/remove endpoints, a JSON listing and
//! the generated HLS output under `/streams`.

mod pages;

use crate::application::error::StreamError;
use crate::application::manager::StreamManager;
use crate::domain::stream::StreamStatus;
use crate::ports::repository::StreamRepository;
use crate::ports::resolver::MediaResolver;
use crate::ports::transcoder::Transcoder;
use axum::{
    extract::{Form, Json, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, Redirect},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::error;

type HttpError = (StatusCode, String);

#[derive(Debug, Deserialize)]
struct StreamRequest {
    #[serde(rename = "videoId")]
    video_id: String,
}

pub fn router<R, V, T>(manager: Arc<StreamManager<R, V, T>>) -> Router
where
    R: StreamRepository + 'static,
    V: MediaResolver + 'static,
    T: Transcoder + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let static_files = ServeDir::new(manager.layout().root());

    Router::new()
        .route("/", get(index::<R, V, T>))
        .route("/add-stream", post(add_stream::<R, V, T>))
        .route("/remove-stream", post(remove_stream::<R, V, T>))
        .route("/api/streams", get(list_streams::<R, V, T>))
        .nest_service("/streams", static_files)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(manager)
}

fn error_response(err: StreamError, action: &str) -> HttpError {
    match err {
        StreamError::InvalidVideoId(e) => (StatusCode::BAD_REQUEST, e.to_string()),
        StreamError::Storage(e) => {
            error!(error = %e, action, "storage error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error {}: storage failure.", action),
            )
        }
        StreamError::Filesystem { path, source } => {
            error!(path = %path.display(), error = %source, action, "filesystem error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error {}: filesystem failure.", action),
            )
        }
        StreamError::Resolution(e) => {
            error!(error = %e, action, "resolution error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("Error fetching stream URL."),
            )
        }
    }
}

async fn index<R, V, T>(
    State(manager): State<Arc<StreamManager<R, V, T>>>,
    headers: HeaderMap,
) -> Result<Html<String>, HttpError>
where
    R: StreamRepository,
    V: MediaResolver,
    T: Transcoder,
{
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("localhost");
    let streams = manager
        .overview()
        .await
        .map_err(|e| error_response(e, "retrieving streams"))?;
    Ok(Html(pages::index(host, &streams)))
}

async fn add_stream<R, V, T>(
    State(manager): State<Arc<StreamManager<R, V, T>>>,
    Form(request): Form<StreamRequest>,
) -> Result<Redirect, HttpError>
where
    R: StreamRepository,
    V: MediaResolver,
    T: Transcoder,
{
    manager
        .start(&request.video_id)
        .await
        .map_err(|e| error_response(e, "adding stream"))?;
    Ok(Redirect::to("/"))
}

async fn remove_stream<R, V, T>(
    State(manager): State<Arc<StreamManager<R, V, T>>>,
    Json(request): Json<StreamRequest>,
) -> Result<StatusCode, HttpError>
where
    R: StreamRepository,
    V: MediaResolver,
    T: Transcoder,
{
    manager
        .stop(&request.video_id)
        .await
        .map_err(|e| error_response(e, "removing stream"))?;
    Ok(StatusCode::OK)
}

async fn list_streams<R, V, T>(
    State(manager): State<Arc<StreamManager<R, V, T>>>,
) -> Result<Json<Vec<StreamStatus>>, HttpError>
where
    R: StreamRepository,
    V: MediaResolver,
    T: Transcoder,
{
    let streams = manager
        .overview()
        .await
        .map_err(|e| error_response(e, "retrieving streams"))?;
    Ok(Json(streams))
}
