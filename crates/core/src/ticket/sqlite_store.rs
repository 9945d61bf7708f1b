//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{
    AssignReceipt, CreateTicketRequest, Priority, ResolveReceipt, Ticket, TicketError,
    TicketStatus, TicketStore,
};

const SELECT_COLUMNS: &str =
    "SELECT id, title, description, priority, status, created_at, assignee FROM tickets";

/// SQLite-backed ticket store.
///
/// Rows keep an autoincrement sequence so listing returns tickets in arrival
/// order, which is what breaks `created_at` ties downstream.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                priority TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                assignee TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_status ON tickets(status);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: String = row.get(0)?;
        let title: String = row.get(1)?;
        let description: String = row.get(2)?;
        let priority_str: String = row.get(3)?;
        let status_str: String = row.get(4)?;
        let created_at_str: String = row.get(5)?;
        let assignee: Option<String> = row.get(6)?;

        let priority = priority_str.parse::<Priority>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, e.into())
        })?;
        let status = status_str.parse::<TicketStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, e.into())
        })?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, e.into())
            })?;

        Ok(Ticket {
            id,
            title,
            description,
            priority,
            status,
            created_at,
            assignee,
        })
    }

    fn insert(conn: &Connection, ticket: &Ticket) -> Result<(), TicketError> {
        conn.execute(
            "INSERT INTO tickets (id, title, description, priority, status, created_at, assignee) VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                ticket.id,
                ticket.title,
                ticket.description,
                ticket.priority.as_str(),
                ticket.status.as_str(),
                ticket.created_at.to_rfc3339(),
                ticket.assignee,
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;
        Ok(())
    }

    fn current_status(conn: &Connection, id: &str) -> Result<TicketStatus, TicketError> {
        let status: Option<String> = conn
            .query_row(
                "SELECT status FROM tickets WHERE id = ?",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TicketError::Database(e.to_string()))?;

        status
            .ok_or_else(TicketError::not_found)?
            .parse::<TicketStatus>()
            .map_err(TicketError::Database)
    }

    fn check_transition(
        id: &str,
        current: TicketStatus,
        next: TicketStatus,
        operation: &str,
    ) -> Result<(), TicketError> {
        if current.can_transition_to(next) {
            Ok(())
        } else {
            Err(TicketError::InvalidState {
                ticket_id: id.to_string(),
                current_status: current,
                operation: operation.to_string(),
            })
        }
    }

    /// Get a ticket by ID.
    pub fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_ticket,
        )
        .optional()
        .map_err(|e| TicketError::Database(e.to_string()))
    }

    /// Count all tickets.
    pub fn count(&self) -> Result<i64, TicketError> {
        let conn = self.lock()?;
        conn.query_row("SELECT COUNT(*) FROM tickets", [], |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))
    }

    /// Insert the demo tickets if the store is empty.
    ///
    /// Returns the number of tickets inserted.
    pub fn seed_demo_tickets(&self) -> Result<usize, TicketError> {
        if self.count()? > 0 {
            return Ok(0);
        }

        let now = Utc::now();
        let seeds = demo_tickets(now);
        let conn = self.lock()?;
        for ticket in &seeds {
            Self::insert(&conn, ticket)?;
        }
        tracing::info!(count = seeds.len(), "Seeded demo tickets");
        Ok(seeds.len())
    }
}

/// The three demo tickets, timestamped relative to `now`.
pub fn demo_tickets(now: DateTime<Utc>) -> Vec<Ticket> {
    let seed = |id: &str, title: &str, description: &str, priority, age: Duration| Ticket {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        priority,
        status: TicketStatus::Open,
        created_at: now - age,
        assignee: None,
    };

    vec![
        seed(
            "ticket-1",
            "Cannot login to account",
            "User reports being unable to login after password reset. Error message shows invalid credentials.",
            Priority::Vip,
            Duration::hours(1),
        ),
        seed(
            "ticket-2",
            "Payment processing failed",
            "Customer attempted to make a purchase but payment was declined despite valid card details.",
            Priority::Regular,
            Duration::hours(2),
        ),
        seed(
            "ticket-3",
            "Account upgrade request",
            "VIP customer requesting immediate account upgrade to premium tier with additional features.",
            Priority::Vip,
            Duration::minutes(30),
        ),
    ]
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(&format!("{} ORDER BY seq ASC", SELECT_COLUMNS))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let rows = stmt
            .query_map([], Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        let ticket = Ticket::open(uuid::Uuid::new_v4().to_string(), request, Utc::now());

        let conn = self.lock()?;
        Self::insert(&conn, &ticket)?;

        Ok(ticket)
    }

    async fn assign_ticket(
        &self,
        ticket_id: &str,
        assignee: &str,
    ) -> Result<AssignReceipt, TicketError> {
        let conn = self.lock()?;

        let current = Self::current_status(&conn, ticket_id)?;
        Self::check_transition(ticket_id, current, TicketStatus::Assigned, "assign")?;

        conn.execute(
            "UPDATE tickets SET status = ?, assignee = ? WHERE id = ?",
            params![TicketStatus::Assigned.as_str(), assignee, ticket_id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(AssignReceipt {
            id: ticket_id.to_string(),
            status: TicketStatus::Assigned,
            assignee: assignee.to_string(),
        })
    }

    async fn resolve_ticket(&self, ticket_id: &str) -> Result<ResolveReceipt, TicketError> {
        let conn = self.lock()?;

        let current = Self::current_status(&conn, ticket_id)?;
        Self::check_transition(ticket_id, current, TicketStatus::Resolved, "resolve")?;

        conn.execute(
            "UPDATE tickets SET status = ? WHERE id = ?",
            params![TicketStatus::Resolved.as_str(), ticket_id],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(ResolveReceipt {
            id: ticket_id.to_string(),
            status: TicketStatus::Resolved,
        })
    }
}
