//! Route handlers
//!
//! [`dispatch`] is the only axum handler. It resolves the [`Route`] from the
//! [`RouteTable`](super::routes::RouteTable), runs the matching handler and turns any
//! [`ApiError`] into an envelope, so nothing escapes as an unhandled fault.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{Query, Request, State},
    http::{Method, StatusCode, Uri, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{
    error::ApiError,
    models::{DetailQuery, Envelope, ListParams, ListQuery, requested_id},
    routes::{EXECUTE_SCRIPT_PATH, Route, STEAM_HOST_PATH, rewrite_versioned},
    state::AppState,
    utils::{normalize_path, parse_query_int, read_body, relay},
};
use crate::manifest::{first_match, normalize_and_paginate};
use crate::upstream::{Upstream, UpstreamResponse};

type HandlerResult = Result<Response, ApiError>;

/// Top-level boundary: route, run, and render failures as envelopes
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    // Dot segments are resolved here so a path can never climb out of the origin base
    let path = normalize_path(request.uri().path());
    let route = state.routes.resolve(request.method(), &path);
    let (parts, body) = request.into_parts();
    debug!(?route, method = %parts.method, path = %path, "Dispatching request");

    let result = match route {
        Route::Preflight => Ok(StatusCode::OK.into_response()),
        Route::Health => Ok(health(&state)),
        Route::ExecuteScript => execute_script(&state).await,
        Route::SteamHost => steam_host(&state).await,
        Route::ComponentDetail => component_detail(&state, &parts, body).await,
        Route::ComponentList => component_list(&state, &parts, body).await,
        Route::VersionedRewrite => versioned_rewrite(&state, &path).await,
        Route::Passthrough => passthrough(&state, &path).await,
    };

    result.unwrap_or_else(|err| {
        if err.status_code().is_server_error() {
            warn!(?route, path = %path, error = %err, "Request failed");
        } else {
            debug!(?route, path = %path, error = %err, "Request rejected");
        }
        err.into_response()
    })
}

/// `GET /`
fn health(state: &AppState) -> Response {
    Envelope::ok(&state.config.server.envelope_msg, Value::Null).into_response()
}

/// Fetch `path` and keep only a successful response. Network faults and
/// non-success statuses both come back as `None`.
async fn fetch_ok(upstream: &Upstream, path: &str) -> Option<UpstreamResponse> {
    match upstream.fetch(path).await {
        Ok(response) if response.is_success() => Some(response),
        Ok(response) => {
            debug!(path, status = response.status.as_u16(), "Upstream miss");
            None
        }
        Err(_) => None,
    }
}

/// `POST /simulator/executeScript`
async fn execute_script(state: &AppState) -> HandlerResult {
    let response = fetch_ok(&state.upstream, EXECUTE_SCRIPT_PATH)
        .await
        .ok_or(ApiError::FetchFailed)?;
    let script: Value = response.json()?;
    Ok(Json(script).into_response())
}

/// `GET /game/getSteamHost`
async fn steam_host(state: &AppState) -> HandlerResult {
    let response = fetch_ok(&state.upstream, STEAM_HOST_PATH)
        .await
        .ok_or(ApiError::FetchFailed)?;
    Ok((
        [(header::CONTENT_TYPE, mime::TEXT_PLAIN.as_ref())],
        response.text(),
    )
        .into_response())
}

/// `GET|POST /simulator/v2/getComponentList`
///
/// Validates `type` against the registry before touching the upstream, then
/// returns the whole manifest with `data.list` normalized and sliced.
async fn component_list(state: &AppState, parts: &Parts, body: Body) -> HandlerResult {
    let params = if parts.method == Method::POST {
        match read_body(body, state.config.server.max_body_bytes.as_usize()).await {
            Ok(bytes) => ListParams::from_body(&bytes),
            // Undecodable bodies get the same treatment as unparseable JSON
            Err(ApiError::InvalidBody) => ListParams::from_body(&[]),
            Err(e) => return Err(e),
        }
    } else {
        ListParams::from_query(&list_query(&parts.uri))
    };

    let (code, path) = params
        .kind
        .and_then(|kind| state.registry.resolve(kind))
        .ok_or(ApiError::InvalidType)?;

    let response = fetch_ok(&state.upstream, path)
        .await
        .ok_or(ApiError::FetchFailed)?;
    let mut manifest: Value = response.json()?;
    normalize_and_paginate(&mut manifest, params.pagination);

    debug!(
        code,
        page = params.pagination.page,
        page_size = params.pagination.page_size,
        "Served component list"
    );
    Ok(Json(manifest).into_response())
}

fn list_query(uri: &Uri) -> ListQuery {
    Query::<ListQuery>::try_from_uri(uri)
        .map(|Query(query)| query)
        .unwrap_or_default()
}

/// `GET|POST /simulator/v2/getComponentDetail`
///
/// Searches every registered manifest, in type-code order, for the requested id.
async fn component_detail(state: &AppState, parts: &Parts, body: Body) -> HandlerResult {
    let id = if parts.method == Method::POST {
        let bytes = read_body(body, state.config.server.max_body_bytes.as_usize()).await?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|_| ApiError::InvalidBody)?;
        body.get("id").and_then(requested_id)
    } else {
        Query::<DetailQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.id)
            .and_then(|raw| parse_query_int(&raw))
            .filter(|id| *id != 0)
    };
    let id = id.ok_or(ApiError::MissingId)?;

    let manifests = fetch_all_manifests(state).await;
    let component = first_match(&manifests, id).ok_or(ApiError::ComponentNotFound)?;

    Ok(Envelope::ok(&state.config.server.envelope_msg, component.clone()).into_response())
}

/// Fetch every registered manifest concurrently. Slot `i` holds the manifest of the
/// `i`-th registry entry, or `None` if that fetch or its parse failed.
async fn fetch_all_manifests(state: &AppState) -> Vec<Option<Value>> {
    let mut tasks = JoinSet::new();
    for (index, (_, path)) in state.registry.iter().enumerate() {
        let upstream = Arc::clone(&state.upstream);
        let path = path.to_string();
        tasks.spawn(async move { (index, fetch_manifest(&upstream, &path).await) });
    }

    let mut manifests = vec![None; state.registry.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, manifest)) => manifests[index] = manifest,
            Err(e) => warn!(error = %e, "Manifest fetch task failed"),
        }
    }
    manifests
}

async fn fetch_manifest(upstream: &Upstream, path: &str) -> Option<Value> {
    let response = fetch_ok(upstream, path).await?;
    match response.json() {
        Ok(manifest) => Some(manifest),
        Err(e) => {
            debug!(path, error = %e, "Skipping malformed manifest");
            None
        }
    }
}

/// `/simulator/v2/*`: served from the unversioned path
async fn versioned_rewrite(state: &AppState, path: &str) -> HandlerResult {
    let target = rewrite_versioned(path);
    let response = fetch_ok(&state.upstream, &target)
        .await
        .ok_or(ApiError::NotFound)?;
    Ok(relay(response))
}

/// Anything else is fetched verbatim; a miss is still a 200
async fn passthrough(state: &AppState, path: &str) -> HandlerResult {
    match fetch_ok(&state.upstream, path).await {
        Some(response) => Ok(relay(response)),
        None => Ok(Envelope::ok(&state.config.server.envelope_msg, Value::Null).into_response()),
    }
}
