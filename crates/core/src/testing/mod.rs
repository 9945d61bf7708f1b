//! Testing utilities and mock implementations.
//!
//! This module provides a mock ticket store and fixtures, allowing the queue
//! controller and the HTTP layer to be tested without a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use supportq_core::testing::{fixtures, MockTicketStore};
//!
//! let store = MockTicketStore::with_tickets(fixtures::mixed_open_queue()).await;
//! store.hold_calls();
//!
//! // Use in a QueueController...
//! ```

mod mock_store;

pub use mock_store::{MockTicketStore, RecordedCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::ticket::{CreateTicketRequest, Priority, Ticket, TicketStatus};

    /// Fixed reference time so ordering tests are deterministic.
    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Create a ticket created `minutes` after [`base_time`].
    ///
    /// Assigned and Resolved tickets get `agent-1` as assignee.
    pub fn ticket(id: &str, priority: Priority, status: TicketStatus, minutes: i64) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: format!("Ticket {}", id),
            description: format!("Description for ticket {} with enough detail", id),
            priority,
            status,
            created_at: base_time() + Duration::minutes(minutes),
            assignee: match status {
                TicketStatus::Open => None,
                _ => Some("agent-1".to_string()),
            },
        }
    }

    /// Four open tickets with classes interleaved by age:
    /// A (Regular, t0), B (VIP, t+1), C (VIP, t+2), D (Regular, t+3).
    pub fn mixed_open_queue() -> Vec<Ticket> {
        vec![
            ticket("A", Priority::Regular, TicketStatus::Open, 0),
            ticket("B", Priority::Vip, TicketStatus::Open, 1),
            ticket("C", Priority::Vip, TicketStatus::Open, 2),
            ticket("D", Priority::Regular, TicketStatus::Open, 3),
        ]
    }

    /// A create request that passes validation.
    pub fn create_request(priority: Priority) -> CreateTicketRequest {
        CreateTicketRequest::new(
            "Cannot login",
            "User cannot login after the password reset email",
            priority,
        )
    }
}
