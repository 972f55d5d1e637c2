pub mod api;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::AppState;
use crate::clients::NodeApi;

pub fn build_router<A: NodeApi + 'static>(state: AppState<A>) -> Router {
    Router::new()
        // Nodes
        .route("/api/v1/nodes", get(api::handle_list_nodes::<A>))
        .route(
            "/api/v1/nodes/{name}",
            get(api::handle_get_node::<A>)
                .put(api::handle_update_node::<A>)
                .delete(api::handle_delete_node::<A>),
        )
        .route("/api/v1/counts/nodes", get(api::handle_count_nodes::<A>))
        // Health
        .route("/healthz", get(api::handle_healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
