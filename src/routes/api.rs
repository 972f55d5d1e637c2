use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::AppState;
use crate::clients::NodeApi;
use crate::error::ApiError;
use crate::models::k8s::*;
use crate::nodes;

pub async fn handle_list_nodes<A: NodeApi>(
    State(state): State<AppState<A>>,
    Query(options): Query<ListOptions>,
) -> Response {
    match nodes::list(state.api.as_ref(), &options).await {
        Ok(views) => Json(views).into_response(),
        Err(e) => error_response("list nodes", e),
    }
}

pub async fn handle_count_nodes<A: NodeApi>(State(state): State<AppState<A>>) -> Response {
    match nodes::count(state.api.as_ref()).await {
        Ok(total) => Json(total).into_response(),
        Err(e) => error_response("count nodes", e),
    }
}

pub async fn handle_get_node<A: NodeApi>(
    State(state): State<AppState<A>>,
    Path(name): Path<String>,
) -> Response {
    match nodes::get_by_name(state.api.as_ref(), &name).await {
        Ok(node) => Json(node).into_response(),
        Err(e) => error_response("get node", e),
    }
}

pub async fn handle_update_node<A: NodeApi>(
    State(state): State<AppState<A>>,
    Path(name): Path<String>,
    body: Result<Json<Node>, JsonRejection>,
) -> Response {
    let node = match body {
        Ok(Json(node)) => node,
        Err(rejection) => {
            let status = Status::failure(400, "BadRequest", rejection.body_text());
            return (StatusCode::BAD_REQUEST, Json(status)).into_response();
        }
    };

    if node.metadata.name != name {
        let status = Status::failure(
            400,
            "BadRequest",
            format!(
                "the name of the object ({:?}) does not match the name on the URL ({:?})",
                node.metadata.name, name
            ),
        );
        return (StatusCode::BAD_REQUEST, Json(status)).into_response();
    }

    match nodes::update(state.api.as_ref(), &node).await {
        Ok(stored) => Json(stored).into_response(),
        Err(e) => error_response("update node", e),
    }
}

pub async fn handle_delete_node<A: NodeApi>(
    State(state): State<AppState<A>>,
    Path(name): Path<String>,
) -> Response {
    match nodes::delete(state.api.as_ref(), &name).await {
        Ok(()) => Json(Status::success(format!("node {:?} deleted", name))).into_response(),
        Err(e) => error_response("delete node", e),
    }
}

pub async fn handle_healthz() -> &'static str {
    "ok\n"
}

fn error_response(op: &str, e: ApiError) -> Response {
    warn!("{} failed: {}", op, e);
    let code = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::BAD_GATEWAY);
    let status = Status::failure(code.as_u16(), e.reason(), e.to_string());
    (code, Json(status)).into_response()
}
