//! Ticket store API handlers.
//!
//! These expose the configured ticket store directly; the agent queue talks to
//! them when it runs against a remote service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supportq_core::ticket::{validate_create_request, ValidationErrors};
use supportq_core::{
    AssignReceipt, CreateTicketRequest, Priority, ResolveReceipt, Ticket, TicketError,
};
use tracing::{debug, info};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a ticket
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Request body for assigning a ticket
#[derive(Debug, Deserialize)]
pub struct AssignTicketBody {
    pub assignee: String,
}

/// Response for listing tickets
#[derive(Debug, Serialize)]
pub struct ListTicketsResponse {
    pub tickets: Vec<Ticket>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct TicketErrorResponse {
    pub error: String,
    /// Per-field messages when a create request fails validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

type ErrorReply = (StatusCode, Json<TicketErrorResponse>);

fn error_reply(err: TicketError) -> ErrorReply {
    let status = match &err {
        TicketError::NotFound(_) => StatusCode::NOT_FOUND,
        TicketError::InvalidState { .. } | TicketError::Conflict(_) => StatusCode::CONFLICT,
        TicketError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        TicketError::Database(_) | TicketError::Http(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    debug!(status = status.as_u16(), error = %err, "Ticket store request failed");
    (
        status,
        Json(TicketErrorResponse {
            error: err.message(),
            fields: None,
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// List all tickets in arrival order
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListTicketsResponse>, ErrorReply> {
    let tickets = state
        .ticket_store()
        .list_tickets()
        .await
        .map_err(error_reply)?;
    Ok(Json(ListTicketsResponse { tickets }))
}

/// Create a new ticket
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> Result<(StatusCode, Json<Ticket>), ErrorReply> {
    let request = CreateTicketRequest::new(body.title, body.description, body.priority).trimmed();

    if let Err(fields) = validate_create_request(&request) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(TicketErrorResponse {
                error: fields.to_string(),
                fields: Some(fields),
            }),
        ));
    }

    let ticket = state
        .ticket_store()
        .create_ticket(request)
        .await
        .map_err(error_reply)?;

    info!(ticket_id = %ticket.id, priority = %ticket.priority, "Ticket created via store API");
    state
        .ws_broadcaster()
        .ticket_updated(&ticket.id, ticket.status);

    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Assign a ticket to an agent
pub async fn assign_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AssignTicketBody>,
) -> Result<Json<AssignReceipt>, ErrorReply> {
    let receipt = state
        .ticket_store()
        .assign_ticket(&id, &body.assignee)
        .await
        .map_err(error_reply)?;

    info!(ticket_id = %id, assignee = %receipt.assignee, "Ticket assigned via store API");
    state
        .ws_broadcaster()
        .ticket_updated(&receipt.id, receipt.status);

    Ok(Json(receipt))
}

/// Resolve an assigned ticket
pub async fn resolve_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ResolveReceipt>, ErrorReply> {
    let receipt = state
        .ticket_store()
        .resolve_ticket(&id)
        .await
        .map_err(error_reply)?;

    info!(ticket_id = %id, "Ticket resolved via store API");
    state
        .ws_broadcaster()
        .ticket_updated(&receipt.id, receipt.status);

    Ok(Json(receipt))
}
