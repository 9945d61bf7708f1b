//! Ticket storage trait and error type.

use async_trait::async_trait;
use thiserror::Error;

use crate::ticket::{AssignReceipt, CreateTicketRequest, ResolveReceipt, Ticket, TicketStatus};

/// Error type for ticket store operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TicketError {
    /// Ticket not found.
    #[error("{0}")]
    NotFound(String),

    /// The ticket's current status does not allow the operation.
    #[error("Cannot {operation} ticket {ticket_id}: current status is {current_status}")]
    InvalidState {
        ticket_id: String,
        current_status: TicketStatus,
        operation: String,
    },

    /// The store refused the operation because of a conflicting change.
    #[error("{0}")]
    Conflict(String),

    /// Transient failure (network, server error, simulated outage).
    #[error("{0}")]
    Transient(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// HTTP transport or protocol error talking to a remote store.
    #[error("HTTP error: {0}")]
    Http(String),
}

impl TicketError {
    /// The store's message for this error, without any wrapping prefix.
    pub fn message(&self) -> String {
        match self {
            TicketError::NotFound(msg) | TicketError::Conflict(msg) => msg.clone(),
            TicketError::Transient(msg) => msg.clone(),
            TicketError::Database(msg) | TicketError::Http(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn not_found() -> Self {
        TicketError::NotFound("Ticket not found".to_string())
    }
}

/// Trait for ticket storage backends.
///
/// Implementations are the source of truth for ticket state: they assign ids and
/// creation timestamps and accept or reject every transition.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Backend name, for logging.
    fn name(&self) -> &str;

    /// List every ticket in arrival order.
    async fn list_tickets(&self) -> Result<Vec<Ticket>, TicketError>;

    /// Create a new Open, unassigned ticket.
    async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError>;

    /// Assign a ticket to an agent.
    async fn assign_ticket(
        &self,
        ticket_id: &str,
        assignee: &str,
    ) -> Result<AssignReceipt, TicketError>;

    /// Mark an assigned ticket as resolved.
    async fn resolve_ticket(&self, ticket_id: &str) -> Result<ResolveReceipt, TicketError>;
}
