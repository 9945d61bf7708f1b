use thiserror::Error;

use crate::ticket::{TicketError, ValidationErrors};

/// Message reported when assign-next finds nothing to assign.
pub const NO_OPEN_TICKETS: &str = "No open tickets available to assign.";

/// Error returned by queue controller actions.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum QueueError {
    /// The create request was malformed.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// Another assign/resolve action is still outstanding.
    #[error("Another action is already in progress (ticket {active_ticket_id})")]
    ActionInFlight { active_ticket_id: String },

    /// The store does not know the ticket.
    #[error("{0}")]
    NotFound(String),

    /// The store refused the transition, or reported a different owner.
    #[error("{0}")]
    Conflict(String),

    /// Network, server or simulated failure.
    #[error("{0}")]
    Transient(String),

    /// Assign-next found no Open ticket.
    #[error("{}", NO_OPEN_TICKETS)]
    NoEligibleTicket,
}

impl QueueError {
    /// Convert a store error, substituting `fallback` when the store gave no message.
    pub fn from_store(err: TicketError, fallback: &str) -> Self {
        let message = err.message();
        let message = if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        };

        match err {
            TicketError::NotFound(_) => QueueError::NotFound(message),
            TicketError::InvalidState { .. } | TicketError::Conflict(_) => {
                QueueError::Conflict(message)
            }
            TicketError::Transient(_) | TicketError::Database(_) | TicketError::Http(_) => {
                QueueError::Transient(message)
            }
        }
    }

    /// Short machine-readable kind, used for metrics labels and API bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            QueueError::Validation(_) => "validation",
            QueueError::ActionInFlight { .. } => "action_in_flight",
            QueueError::NotFound(_) => "not_found",
            QueueError::Conflict(_) => "conflict",
            QueueError::Transient(_) => "transient",
            QueueError::NoEligibleTicket => "no_eligible_ticket",
        }
    }
}
