pub mod pages;

use crate::domain::{ReadOptions, decode_project_key};
use crate::infra::{
    HistoryPaths, find_session, list_sessions_in_dir, read_session, resolve_project_dir,
    scan_projects, search_history,
};
use axum::Router;
use axum::extract::{Path as RoutePath, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::net::SocketAddr;

pub const DEFAULT_PORT: u16 = 5000;

const SEARCH_LIMIT: usize = 50;

#[derive(Clone)]
pub struct AppState {
    pub paths: HistoryPaths,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/project/{encoded}", get(project_sessions))
        .route("/session/{session_id}", get(session_detail))
        .route("/search", get(search))
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let scan = scan_projects(&state.paths);
    Html(pages::projects_page(&scan.projects))
}

async fn project_sessions(
    State(state): State<AppState>,
    RoutePath(encoded): RoutePath<String>,
) -> Response {
    let Ok(project_dir) = resolve_project_dir(&state.paths, &encoded) else {
        return not_found("Project not found");
    };

    // Substring fallback may resolve a different directory than requested;
    // display the path of the directory that actually matched.
    let resolved_key = project_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(&encoded);
    let scan = list_sessions_in_dir(&project_dir);
    Html(pages::sessions_page(
        &decode_project_key(resolved_key),
        &scan.sessions,
    ))
    .into_response()
}

async fn session_detail(
    State(state): State<AppState>,
    RoutePath(session_id): RoutePath<String>,
) -> Response {
    // A missing session is a 404, distinct from an empty-but-valid one.
    let Some(hit) = find_session(&state.paths, &session_id) else {
        return not_found("Session not found");
    };

    // The page carries every block; thinking and tool visibility are
    // client-side toggles.
    match read_session(
        &hit.log_path,
        ReadOptions {
            include_thinking: true,
        },
    ) {
        Ok(transcript) => {
            Html(pages::session_page(&session_id, &transcript.messages)).into_response()
        }
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(pages::error_page(&error.to_string())),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    if params.q.is_empty() {
        return Html(pages::search_form_page()).into_response();
    }

    match search_history(&state.paths, &params.q, SEARCH_LIMIT) {
        Ok(result) => Html(pages::search_page(&params.q, &result.entries)).into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(pages::error_page(&error.to_string())),
        )
            .into_response(),
    }
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Html(pages::not_found_page(what))).into_response()
}

pub async fn run_http_server(port: u16, paths: HistoryPaths) -> Result<(), String> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let app = build_router(AppState { paths });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|error| error.to_string())?;
    let local_addr = listener.local_addr().map_err(|error| error.to_string())?;
    println!("listening on http://{local_addr}");

    axum::serve(listener, app)
        .await
        .map_err(|error| error.to_string())
}
