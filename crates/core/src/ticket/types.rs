//! Core ticket data types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Priority
// ============================================================================

/// Priority class of a ticket. VIP tickets are always served before Regular.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    #[serde(rename = "VIP")]
    Vip,
    Regular,
}

impl Priority {
    /// Queue rank of the class (lower is served first).
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Vip => 0,
            Priority::Regular => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Vip => "VIP",
            Priority::Regular => "Regular",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vip" => Ok(Priority::Vip),
            "regular" => Ok(Priority::Regular),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

// ============================================================================
// Status
// ============================================================================

/// Lifecycle status of a ticket.
///
/// The only legal path is `Open -> Assigned -> Resolved`; `Resolved` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TicketStatus {
    Open,
    Assigned,
    Resolved,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [
        TicketStatus::Open,
        TicketStatus::Assigned,
        TicketStatus::Resolved,
    ];

    /// Returns true if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved)
    }

    /// Returns true if the ticket may be picked for assignment.
    pub fn is_eligible(&self) -> bool {
        matches!(self, TicketStatus::Open)
    }

    /// Returns true if `next` is the single legal successor of this status.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (TicketStatus::Open, TicketStatus::Assigned)
                | (TicketStatus::Assigned, TicketStatus::Resolved)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "Open",
            TicketStatus::Assigned => "Assigned",
            TicketStatus::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(TicketStatus::Open),
            "assigned" => Ok(TicketStatus::Assigned),
            "resolved" => Ok(TicketStatus::Resolved),
            other => Err(format!("unknown ticket status: {}", other)),
        }
    }
}

// ============================================================================
// Ticket
// ============================================================================

/// A support ticket.
///
/// `id`, `title`, `description`, `priority` and `created_at` never change after
/// creation. `assignee` is `Some` exactly when the status is Assigned or Resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    /// Unique identifier assigned by the store.
    pub id: String,

    pub title: String,

    pub description: String,

    pub priority: Priority,

    pub status: TicketStatus,

    /// Store-assigned creation time; the FIFO key within a priority class.
    pub created_at: DateTime<Utc>,

    /// Agent holding the ticket. Set once on assignment, never cleared.
    pub assignee: Option<String>,
}

impl Ticket {
    /// Build a freshly created ticket (Open, unassigned).
    pub fn open(
        id: impl Into<String>,
        request: CreateTicketRequest,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: request.title,
            description: request.description,
            priority: request.priority,
            status: TicketStatus::Open,
            created_at,
            assignee: None,
        }
    }

    /// Returns true if the assignee/status invariant holds.
    pub fn is_consistent(&self) -> bool {
        match self.status {
            TicketStatus::Open => self.assignee.is_none(),
            TicketStatus::Assigned | TicketStatus::Resolved => self.assignee.is_some(),
        }
    }
}

/// Request to create a new ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl CreateTicketRequest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
        }
    }

    /// The request as it should be stored: title and description trimmed.
    pub fn trimmed(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            priority: self.priority,
        }
    }
}

/// Store acknowledgement of an assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignReceipt {
    pub id: String,
    pub status: TicketStatus,
    pub assignee: String,
}

/// Store acknowledgement of a resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolveReceipt {
    pub id: String,
    pub status: TicketStatus,
}
