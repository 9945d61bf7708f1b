use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, queue, tickets, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Ticket store
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets", post(tickets::create_ticket))
        .route("/tickets/{id}/assign", post(tickets::assign_ticket))
        .route("/tickets/{id}/resolve", post(tickets::resolve_ticket))
        // Agent queue
        .route("/queue", get(queue::get_queue))
        .route("/queue/filter", put(queue::set_filter))
        .route("/queue/next", get(queue::peek_next))
        .route("/queue/refresh", post(queue::refresh))
        .route("/queue/tickets", post(queue::create_ticket))
        .route("/queue/assign-next", post(queue::assign_next))
        .route("/queue/tickets/{id}/assign", post(queue::assign_ticket))
        .route("/queue/tickets/{id}/resolve", post(queue::resolve_ticket))
        .route("/queue/error", delete(queue::clear_error))
        // Notifications
        .route("/ws", get(ws::ws_handler))
        .with_state(state.clone());

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics).with_state(state))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
