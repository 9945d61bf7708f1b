//! Agent queue API handlers.
//!
//! Thin wrappers over the [`QueueController`](supportq_core::QueueController):
//! every action answers with `{ success, error, ... }` and a status code that
//! reflects the failure kind.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supportq_core::ticket::ValidationErrors;
use supportq_core::{
    AssignReceipt, CreateTicketRequest, Priority, QueueError, ResolveReceipt, StatusCounts,
    StatusFilter, Ticket,
};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for viewing the queue
#[derive(Debug, Deserialize)]
pub struct QueueParams {
    /// Status filter; the controller's current filter when absent.
    pub status: Option<StatusFilter>,
}

/// Request body for changing the current filter
#[derive(Debug, Deserialize)]
pub struct SetFilterBody {
    pub status: StatusFilter,
}

/// Request body for assign actions
#[derive(Debug, Default, Deserialize)]
pub struct AssignBody {
    /// Agent to assign to; the configured agent when absent.
    pub agent: Option<String>,
}

/// Request body for creating a ticket through the queue
#[derive(Debug, Deserialize)]
pub struct CreateTicketBody {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

/// Snapshot of the agent queue
#[derive(Debug, Serialize)]
pub struct QueueResponse {
    pub tickets: Vec<Ticket>,
    pub counts: StatusCounts,
    pub filter: StatusFilter,
    pub active_ticket_id: Option<String>,
    pub last_error: Option<String>,
    pub has_open_tickets: bool,
    pub agent_id: String,
}

#[derive(Debug, Serialize)]
pub struct NextTicketResponse {
    pub ticket: Option<Ticket>,
}

/// Outcome of a queue action
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub error: Option<String>,
    /// Machine-readable failure kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticket: Option<Ticket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickets: Option<Vec<Ticket>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<serde_json::Value>,
}

impl ActionResponse {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
            kind: None,
            fields: None,
            ticket: None,
            tickets: None,
            receipt: None,
        }
    }

    fn with_receipt<T: Serialize>(receipt: &T) -> Self {
        Self {
            receipt: serde_json::to_value(receipt).ok(),
            ..Self::ok()
        }
    }

    fn failed(err: &QueueError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
            fields: match err {
                QueueError::Validation(fields) => Some(fields.clone()),
                _ => None,
            },
            ..Self::ok()
        }
    }
}

type ActionReply = (StatusCode, Json<ActionResponse>);

fn status_for(err: &QueueError) -> StatusCode {
    match err {
        QueueError::Validation(_) => StatusCode::BAD_REQUEST,
        QueueError::ActionInFlight { .. }
        | QueueError::NoEligibleTicket
        | QueueError::Conflict(_) => StatusCode::CONFLICT,
        QueueError::NotFound(_) => StatusCode::NOT_FOUND,
        QueueError::Transient(_) => StatusCode::BAD_GATEWAY,
    }
}

fn failure(err: QueueError) -> ActionReply {
    (status_for(&err), Json(ActionResponse::failed(&err)))
}

fn assign_reply(result: Result<AssignReceipt, QueueError>) -> ActionReply {
    match result {
        Ok(receipt) => (StatusCode::OK, Json(ActionResponse::with_receipt(&receipt))),
        Err(err) => failure(err),
    }
}

fn resolve_reply(result: Result<ResolveReceipt, QueueError>) -> ActionReply {
    match result {
        Ok(receipt) => (StatusCode::OK, Json(ActionResponse::with_receipt(&receipt))),
        Err(err) => failure(err),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Current queue view
pub async fn get_queue(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueueParams>,
) -> Json<QueueResponse> {
    let queue = state.queue();
    let filter = params.status.unwrap_or_else(|| queue.filter());
    let snapshot = queue.snapshot();

    Json(QueueResponse {
        tickets: supportq_core::queue::filter_view(&snapshot.tickets, filter),
        counts: supportq_core::queue::count_by_status(&snapshot.tickets),
        filter,
        active_ticket_id: snapshot.active_ticket_id,
        last_error: snapshot.last_error,
        has_open_tickets: snapshot.tickets.iter().any(|t| t.status.is_eligible()),
        agent_id: queue.agent_id().to_string(),
    })
}

/// Change the queue's current filter
pub async fn set_filter(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetFilterBody>,
) -> Json<ActionResponse> {
    state.queue().set_filter(body.status);
    Json(ActionResponse {
        tickets: Some(state.queue().visible_tickets()),
        ..ActionResponse::ok()
    })
}

/// The ticket assign-next would pick
pub async fn peek_next(State(state): State<Arc<AppState>>) -> Json<NextTicketResponse> {
    Json(NextTicketResponse {
        ticket: state.queue().next_eligible(),
    })
}

/// Reload the queue from the store
pub async fn refresh(State(state): State<Arc<AppState>>) -> ActionReply {
    match state.queue().refresh().await {
        Ok(tickets) => (
            StatusCode::OK,
            Json(ActionResponse {
                tickets: Some(tickets),
                ..ActionResponse::ok()
            }),
        ),
        Err(err) => failure(err),
    }
}

/// Create a ticket through the queue
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTicketBody>,
) -> ActionReply {
    let request = CreateTicketRequest::new(body.title, body.description, body.priority);
    match state.queue().create(request).await {
        Ok(ticket) => (
            StatusCode::CREATED,
            Json(ActionResponse {
                ticket: Some(ticket),
                ..ActionResponse::ok()
            }),
        ),
        Err(err) => failure(err),
    }
}

/// Assign the next eligible ticket
pub async fn assign_next(
    State(state): State<Arc<AppState>>,
    body: Option<Json<AssignBody>>,
) -> ActionReply {
    let queue = state.queue();
    let agent = agent_or_default(body, queue.agent_id());
    assign_reply(queue.assign_next(&agent).await)
}

/// Assign a specific ticket
pub async fn assign_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<AssignBody>>,
) -> ActionReply {
    let queue = state.queue();
    let agent = agent_or_default(body, queue.agent_id());
    assign_reply(queue.assign(&id, &agent).await)
}

/// Resolve a ticket
pub async fn resolve_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ActionReply {
    resolve_reply(state.queue().resolve(&id).await)
}

/// Dismiss the last error
pub async fn clear_error(State(state): State<Arc<AppState>>) -> Json<ActionResponse> {
    state.queue().clear_error();
    Json(ActionResponse::ok())
}

fn agent_or_default(body: Option<Json<AssignBody>>, default: &str) -> String {
    body.and_then(|Json(b)| b.agent)
        .filter(|agent| !agent.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
