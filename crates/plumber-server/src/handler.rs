use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde_json::Value;

use plumber_store::{Filter, FilterError};
use plumber_types::PushMode;

use crate::error::{ServerError, ServerResult};
use crate::format::{self, Format};
use crate::state::AppState;

type Params = Query<HashMap<String, String>>;

fn param<'a>(params: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    params.get(name).map(String::as_str)
}

/// `POST /{stage}/push` -- push the body's items, answer with the count.
pub async fn push_handler(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    Query(params): Params,
    body: Bytes,
) -> ServerResult<Response> {
    let stage = state.stage(&stage)?;
    let format = Format::from_param(param(&params, "format"))?;
    let push_if_new = format::parse_flag(param(&params, "push_if_new"));
    let window = format::parse_count(param(&params, "push_if_older_than"), 0, "if_older_than")?;
    let items = format::decode_items(format, &body)?;

    let mode = PushMode::from_flags(push_if_new, window);
    let inserted = state.queue.push(stage, items, mode).await?;
    Ok(format::render_count(format, inserted))
}

/// `GET /{stage}/pop` -- claim up to `quantity` entries.
pub async fn pop_handler(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    Query(params): Params,
) -> ServerResult<Response> {
    let stage = state.stage(&stage)?;
    let format = Format::from_param(param(&params, "format"))?;
    let quantity = format::parse_count(param(&params, "quantity"), 1, "quantity")?;
    if quantity == 0 {
        return Err(ServerError::bad_request_with(
            "Error: wrong quantity parameter",
            "quantity must be at least 1",
        ));
    }
    let quantity = usize::try_from(quantity)
        .map_err(|e| ServerError::bad_request_with("Error: wrong quantity parameter", e))?;

    let items = state.queue.pop(stage, quantity).await?;
    Ok(format::render_items(format, items))
}

/// `POST /{stage}/flush` -- drop the stage queue.
pub async fn flush_handler(
    State(state): State<AppState>,
    Path(stage): Path<String>,
) -> ServerResult<StatusCode> {
    let stage = state.stage(&stage)?;
    state.queue.flush(stage).await?;
    Ok(StatusCode::OK)
}

/// `GET /{stage}/stats` -- entry counts for the stage queue.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(stage): Path<String>,
) -> ServerResult<Response> {
    let stage = state.stage(&stage)?;
    let stats = state.queue.stats(stage).await?;
    Ok(Json(stats).into_response())
}

/// `POST /{stage}/store` -- store the body, answer with its id.
pub async fn store_handler(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    Query(params): Params,
    body: Bytes,
) -> ServerResult<Response> {
    let stage = state.stage(&stage)?;
    let format = Format::from_param(param(&params, "format"))?;
    let payload = format::decode_object(format, &body)?;

    let id = state.objects.store(stage, payload).await?;
    Ok(format::render_id(format, id.to_string()))
}

/// `GET /{stage}/load` -- fetch (and optionally delete) one matching object.
pub async fn load_handler(
    State(state): State<AppState>,
    Path(stage): Path<String>,
    Query(params): Params,
) -> ServerResult<Response> {
    let stage = state.stage(&stage)?;
    let format = Format::from_param(param(&params, "format"))?;
    let delete = format::parse_flag(param(&params, "delete"));
    let filter = parse_filter(param(&params, "filter"))?;

    let payload = state.objects.load(stage, &filter, delete).await?;
    Ok(format::render_loaded(format, payload))
}

fn parse_filter(raw: Option<&str>) -> ServerResult<Filter> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Err(ServerError::bad_request("Error: missing filter")),
    };
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ServerError::bad_request_with("Error: can't decode JSON filter", e))?;
    Filter::from_json(&value).map_err(|e| match e {
        FilterError::NotAnObject => {
            ServerError::bad_request_with("Error: filter must be a JSON object", &value)
        }
        other => ServerError::bad_request(format!("Error: invalid filter: {other}")),
    })
}

/// `GET /_healthcheck`
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}
