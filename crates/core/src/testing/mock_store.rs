//! Mock ticket store for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{watch, RwLock};

use crate::ticket::{
    AssignReceipt, CreateTicketRequest, ResolveReceipt, Ticket, TicketError, TicketStatus,
    TicketStore,
};

/// A store call recorded for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    List,
    Create { title: String },
    Assign { ticket_id: String, assignee: String },
    Resolve { ticket_id: String },
}

/// Mock implementation of the TicketStore trait.
///
/// Provides controllable behavior for testing:
/// - Track every call for assertions
/// - Fail the next call with a chosen error
/// - Report a different assignee than the one requested
/// - Hold calls pending until released
///
/// Transitions follow the same rules as the real stores.
///
/// # Example
///
/// ```rust,ignore
/// use supportq_core::testing::MockTicketStore;
///
/// let store = MockTicketStore::new();
/// store.set_tickets(vec![/* tickets */]).await;
/// store.set_next_error(TicketError::Transient("boom".into())).await;
///
/// // ...drive a QueueController...
///
/// assert_eq!(store.call_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockTicketStore {
    tickets: Arc<RwLock<Vec<Ticket>>>,
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<TicketError>>>,
    /// If set, assign receipts name this agent instead of the requested one.
    assignee_override: Arc<RwLock<Option<String>>>,
    /// If set, assign and resolve receipts carry this id.
    receipt_id_override: Arc<RwLock<Option<String>>>,
    /// Calls wait while the gate is closed.
    gate: watch::Sender<bool>,
    next_id: Arc<RwLock<u64>>,
}

impl Default for MockTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTicketStore {
    /// Create an empty mock store with an open gate.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            tickets: Arc::new(RwLock::new(Vec::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            assignee_override: Arc::new(RwLock::new(None)),
            receipt_id_override: Arc::new(RwLock::new(None)),
            gate,
            next_id: Arc::new(RwLock::new(1)),
        }
    }

    /// Create a mock store holding `tickets`.
    pub async fn with_tickets(tickets: Vec<Ticket>) -> Self {
        let store = Self::new();
        store.set_tickets(tickets).await;
        store
    }

    pub async fn set_tickets(&self, tickets: Vec<Ticket>) {
        *self.tickets.write().await = tickets;
    }

    /// Current store-side tickets.
    pub async fn tickets(&self) -> Vec<Ticket> {
        self.tickets.read().await.clone()
    }

    pub async fn ticket(&self, id: &str) -> Option<Ticket> {
        self.tickets.read().await.iter().find(|t| t.id == id).cloned()
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: TicketError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make assign receipts name `assignee` regardless of the request.
    pub async fn set_assignee_override(&self, assignee: Option<&str>) {
        *self.assignee_override.write().await = assignee.map(String::from);
    }

    /// Make receipts name `ticket_id` instead of the ticket that changed.
    pub async fn set_receipt_id_override(&self, ticket_id: Option<&str>) {
        *self.receipt_id_override.write().await = ticket_id.map(String::from);
    }

    async fn receipt_id(&self, actual: &str) -> String {
        self.receipt_id_override
            .read()
            .await
            .clone()
            .unwrap_or_else(|| actual.to_string())
    }

    /// Hold every subsequent call pending until [`MockTicketStore::release_calls`].
    pub fn hold_calls(&self) {
        self.gate.send_replace(false);
    }

    /// Let held and future calls proceed.
    pub fn release_calls(&self) {
        self.gate.send_replace(true);
    }

    /// Wait until at least `count` calls have been recorded.
    pub async fn wait_for_calls(&self, count: usize) {
        while self.call_count().await < count {
            tokio::task::yield_now().await;
        }
    }

    async fn enter(&self, call: RecordedCall) -> Result<(), TicketError> {
        self.calls.write().await.push(call);

        let mut gate = self.gate.subscribe();
        // The sender lives as long as the store, so this only fails if the store is gone.
        let _ = gate.wait_for(|open| *open).await;

        match self.next_error.write().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TicketStore for MockTicketStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>, TicketError> {
        self.enter(RecordedCall::List).await?;
        Ok(self.tickets().await)
    }

    async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        self.enter(RecordedCall::Create {
            title: request.title.clone(),
        })
        .await?;

        let id = {
            let mut next_id = self.next_id.write().await;
            let id = format!("mock-{}", *next_id);
            *next_id += 1;
            id
        };
        let ticket = Ticket::open(id, request, Utc::now());
        self.tickets.write().await.push(ticket.clone());
        Ok(ticket)
    }

    async fn assign_ticket(
        &self,
        ticket_id: &str,
        assignee: &str,
    ) -> Result<AssignReceipt, TicketError> {
        self.enter(RecordedCall::Assign {
            ticket_id: ticket_id.to_string(),
            assignee: assignee.to_string(),
        })
        .await?;

        let assignee = self
            .assignee_override
            .read()
            .await
            .clone()
            .unwrap_or_else(|| assignee.to_string());

        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or_else(TicketError::not_found)?;
        if ticket.status != TicketStatus::Open {
            return Err(TicketError::InvalidState {
                ticket_id: ticket_id.to_string(),
                current_status: ticket.status,
                operation: "assign".to_string(),
            });
        }
        ticket.status = TicketStatus::Assigned;
        ticket.assignee = Some(assignee.clone());
        let id = ticket.id.clone();
        drop(tickets);

        Ok(AssignReceipt {
            id: self.receipt_id(&id).await,
            status: TicketStatus::Assigned,
            assignee,
        })
    }

    async fn resolve_ticket(&self, ticket_id: &str) -> Result<ResolveReceipt, TicketError> {
        self.enter(RecordedCall::Resolve {
            ticket_id: ticket_id.to_string(),
        })
        .await?;

        let mut tickets = self.tickets.write().await;
        let ticket = tickets
            .iter_mut()
            .find(|t| t.id == ticket_id)
            .ok_or_else(TicketError::not_found)?;
        if ticket.status != TicketStatus::Assigned {
            return Err(TicketError::InvalidState {
                ticket_id: ticket_id.to_string(),
                current_status: ticket.status,
                operation: "resolve".to_string(),
            });
        }
        ticket.status = TicketStatus::Resolved;
        let id = ticket.id.clone();
        drop(tickets);

        Ok(ResolveReceipt {
            id: self.receipt_id(&id).await,
            status: TicketStatus::Resolved,
        })
    }
}
