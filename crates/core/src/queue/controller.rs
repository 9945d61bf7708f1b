//! Queue controller: the agent-facing ticket lifecycle.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::metrics;
use crate::notify::{Notification, Notifier};
use crate::ticket::{
    validate_create_request, AssignReceipt, CreateTicketRequest, ResolveReceipt, Ticket,
    TicketError, TicketStore,
};

use super::engine::{self, StatusCounts, StatusFilter};
use super::error::QueueError;
use super::state::{QueueEvent, QueueState};

const FETCH_FALLBACK: &str = "Failed to fetch tickets";
const CREATE_FALLBACK: &str = "Failed to create ticket";
const ASSIGN_FALLBACK: &str = "Assignment failed. Please try again.";
const RESOLVE_FALLBACK: &str = "Failed to resolve ticket";

const CREATED: &str = "Ticket created successfully!";
const ASSIGNED: &str = "Ticket assigned successfully!";
const ASSIGNED_NEXT: &str = "Next ticket assigned successfully!";
const RESOLVED: &str = "Ticket resolved successfully!";

fn lock(state: &Mutex<QueueState>) -> MutexGuard<'_, QueueState> {
    // The reducer never panics mid-update, so a poisoned state is still whole.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn store_error_kind(err: &TicketError) -> &'static str {
    match err {
        TicketError::NotFound(_) => "not_found",
        TicketError::InvalidState { .. } => "invalid_state",
        TicketError::Conflict(_) => "conflict",
        TicketError::Transient(_) => "transient",
        TicketError::Database(_) => "database",
        TicketError::Http(_) => "http",
    }
}

/// The store acknowledged a different ticket than the one asked for.
fn mismatched_receipt(ticket_id: &str, receipt_id: &str) -> QueueError {
    QueueError::Conflict(format!(
        "Store acknowledged ticket {} instead of {}",
        receipt_id, ticket_id
    ))
}

/// Holds the single in-flight slot. Dropping it releases the slot.
struct InFlight<'a> {
    state: &'a Mutex<QueueState>,
    released: bool,
}

impl InFlight<'_> {
    /// Apply the action's outcome and release the slot in one critical section.
    fn finish(mut self, outcome: QueueEvent) {
        let mut state = lock(self.state);
        state.apply(outcome);
        state.apply(QueueEvent::ActionEnded);
        self.released = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.released {
            debug!("In-flight action abandoned, releasing slot");
            lock(self.state).apply(QueueEvent::ActionEnded);
        }
    }
}

/// Owns the local ticket collection and mediates every change through the store.
///
/// At most one assign/resolve action is outstanding at a time. Create and
/// refresh are not guarded.
pub struct QueueController {
    store: Arc<dyn TicketStore>,
    notifier: Arc<dyn Notifier>,
    agent_id: String,
    state: Mutex<QueueState>,
}

impl QueueController {
    pub fn new(
        store: Arc<dyn TicketStore>,
        notifier: Arc<dyn Notifier>,
        agent_id: impl Into<String>,
    ) -> Self {
        Self {
            store,
            notifier,
            agent_id: agent_id.into(),
            state: Mutex::new(QueueState::default()),
        }
    }

    /// Agent used when a caller does not name one.
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Name of the backing store.
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Replace the collection with the store's current list.
    pub async fn refresh(&self) -> Result<Vec<Ticket>, QueueError> {
        self.apply(QueueEvent::ErrorCleared);

        match self.call("list", self.store.list_tickets()).await {
            Ok(tickets) => {
                info!(count = tickets.len(), store = %self.store.name(), "Loaded tickets");
                self.apply(QueueEvent::Loaded(tickets.clone()));
                metrics::QUEUE_ACTIONS
                    .with_label_values(&["refresh", "success"])
                    .inc();
                Ok(tickets)
            }
            Err(e) => {
                let err = QueueError::from_store(e, FETCH_FALLBACK);
                self.apply(QueueEvent::Failed(err.to_string()));
                self.report_failure("refresh", &err, None);
                Err(err)
            }
        }
    }

    /// Validate and create a ticket. Invalid requests never reach the store.
    pub async fn create(&self, request: CreateTicketRequest) -> Result<Ticket, QueueError> {
        let request = request.trimmed();
        if let Err(errors) = validate_create_request(&request) {
            let err = QueueError::Validation(errors);
            self.report_failure("create", &err, None);
            return Err(err);
        }

        self.apply(QueueEvent::ErrorCleared);

        match self.call("create", self.store.create_ticket(request)).await {
            Ok(ticket) => {
                info!(ticket_id = %ticket.id, priority = %ticket.priority, "Ticket created");
                self.apply(QueueEvent::Created(ticket.clone()));
                metrics::QUEUE_ACTIONS
                    .with_label_values(&["create", "success"])
                    .inc();
                self.notifier
                    .notify(Notification::success(CREATED, Some(&ticket.id)));
                Ok(ticket)
            }
            Err(e) => {
                let err = QueueError::from_store(e, CREATE_FALLBACK);
                self.apply(QueueEvent::Failed(err.to_string()));
                self.report_failure("create", &err, None);
                Err(err)
            }
        }
    }

    /// Assign a ticket to `agent_id`.
    pub async fn assign(
        &self,
        ticket_id: &str,
        agent_id: &str,
    ) -> Result<AssignReceipt, QueueError> {
        self.assign_with("assign", ticket_id, agent_id, ASSIGNED)
            .await
    }

    /// Assign the highest-priority open ticket to `agent_id`.
    ///
    /// The pick is made from the local collection; if the store changed
    /// underneath, the store rejects the assignment and the failure is reported.
    pub async fn assign_next(&self, agent_id: &str) -> Result<AssignReceipt, QueueError> {
        let Some(next) = self.next_eligible() else {
            let err = QueueError::NoEligibleTicket;
            metrics::QUEUE_EMPTY.inc();
            self.apply(QueueEvent::Failed(err.to_string()));
            self.report_failure("assign_next", &err, None);
            return Err(err);
        };

        debug!(ticket_id = %next.id, priority = %next.priority, "Next eligible ticket");
        self.assign_with("assign_next", &next.id, agent_id, ASSIGNED_NEXT)
            .await
    }

    /// Resolve a ticket. The store decides whether the transition is allowed.
    pub async fn resolve(&self, ticket_id: &str) -> Result<ResolveReceipt, QueueError> {
        let guard = self.begin("resolve", ticket_id)?;

        let result = self
            .call("resolve", self.store.resolve_ticket(ticket_id))
            .await
            .map_err(|e| QueueError::from_store(e, RESOLVE_FALLBACK))
            .and_then(|receipt| {
                if receipt.id == ticket_id {
                    Ok(receipt)
                } else {
                    Err(mismatched_receipt(ticket_id, &receipt.id))
                }
            });

        match result {
            Ok(receipt) => {
                info!(ticket_id, "Ticket resolved");
                guard.finish(QueueEvent::Resolved {
                    ticket_id: ticket_id.to_string(),
                });
                metrics::QUEUE_ACTIONS
                    .with_label_values(&["resolve", "success"])
                    .inc();
                self.notifier
                    .notify(Notification::success(RESOLVED, Some(ticket_id)));
                Ok(receipt)
            }
            Err(err) => {
                guard.finish(QueueEvent::Failed(err.to_string()));
                self.report_failure("resolve", &err, Some(ticket_id));
                Err(err)
            }
        }
    }

    async fn assign_with(
        &self,
        action: &'static str,
        ticket_id: &str,
        agent_id: &str,
        success_message: &str,
    ) -> Result<AssignReceipt, QueueError> {
        let guard = self.begin(action, ticket_id)?;

        let result = self
            .call("assign", self.store.assign_ticket(ticket_id, agent_id))
            .await
            .map_err(|e| QueueError::from_store(e, ASSIGN_FALLBACK))
            .and_then(|receipt| {
                if receipt.id != ticket_id {
                    Err(mismatched_receipt(ticket_id, &receipt.id))
                } else if receipt.assignee == agent_id {
                    Ok(receipt)
                } else {
                    Err(QueueError::Conflict(format!(
                        "Ticket {} is assigned to {}",
                        ticket_id, receipt.assignee
                    )))
                }
            });

        match result {
            Ok(receipt) => {
                info!(ticket_id, agent_id, "Ticket assigned");
                guard.finish(QueueEvent::Assigned {
                    ticket_id: ticket_id.to_string(),
                    assignee: receipt.assignee.clone(),
                });
                metrics::QUEUE_ACTIONS
                    .with_label_values(&[action, "success"])
                    .inc();
                self.notifier
                    .notify(Notification::success(success_message, Some(ticket_id)));
                Ok(receipt)
            }
            Err(err) => {
                guard.finish(QueueEvent::Failed(err.to_string()));
                self.report_failure(action, &err, Some(ticket_id));
                Err(err)
            }
        }
    }

    /// Take the in-flight slot, or fail without touching the store.
    fn begin(&self, action: &'static str, ticket_id: &str) -> Result<InFlight<'_>, QueueError> {
        let mut state = lock(&self.state);
        if let Some(active_ticket_id) = state.active_ticket_id.clone() {
            let err = QueueError::ActionInFlight { active_ticket_id };
            drop(state);
            metrics::GUARD_REJECTIONS.inc();
            self.report_failure(action, &err, Some(ticket_id));
            return Err(err);
        }

        state.apply(QueueEvent::ActionStarted {
            ticket_id: ticket_id.to_string(),
        });
        Ok(InFlight {
            state: &self.state,
            released: false,
        })
    }

    /// Time a store call and count its failures.
    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, TicketError>>,
    ) -> Result<T, TicketError> {
        let store = self.store.name().to_string();
        let start = Instant::now();
        let result = fut.await;
        metrics::STORE_CALL_DURATION
            .with_label_values(&[store.as_str(), operation])
            .observe(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            error!(store = %store, operation, error = %e, "Store call failed");
            metrics::STORE_CALL_ERRORS
                .with_label_values(&[store.as_str(), operation, store_error_kind(e)])
                .inc();
        }
        result
    }

    fn report_failure(&self, action: &'static str, err: &QueueError, ticket_id: Option<&str>) {
        warn!(action, ticket_id, kind = err.kind(), error = %err, "Queue action failed");
        metrics::QUEUE_ACTIONS
            .with_label_values(&[action, err.kind()])
            .inc();
        self.notifier
            .notify(Notification::error(err.to_string(), ticket_id));
    }

    fn apply(&self, event: QueueEvent) {
        lock(&self.state).apply(event);
    }

    // =========================================================================
    // Read accessors
    // =========================================================================

    /// Ordered view under the current filter.
    pub fn visible_tickets(&self) -> Vec<Ticket> {
        let state = lock(&self.state);
        engine::filter_view(&state.tickets, state.filter)
    }

    /// Ordered view under an explicit filter.
    pub fn view(&self, filter: StatusFilter) -> Vec<Ticket> {
        engine::filter_view(&lock(&self.state).tickets, filter)
    }

    /// The collection in store arrival order.
    pub fn all_tickets(&self) -> Vec<Ticket> {
        lock(&self.state).tickets.clone()
    }

    pub fn counts(&self) -> StatusCounts {
        engine::count_by_status(&lock(&self.state).tickets)
    }

    pub fn has_open_tickets(&self) -> bool {
        lock(&self.state)
            .tickets
            .iter()
            .any(|t| t.status.is_eligible())
    }

    /// The ticket assign-next would pick right now.
    pub fn next_eligible(&self) -> Option<Ticket> {
        engine::next_eligible(&lock(&self.state).tickets)
    }

    pub fn active_ticket_id(&self) -> Option<String> {
        lock(&self.state).active_ticket_id.clone()
    }

    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    pub fn clear_error(&self) {
        self.apply(QueueEvent::ErrorCleared);
    }

    pub fn filter(&self) -> StatusFilter {
        lock(&self.state).filter
    }

    pub fn set_filter(&self, filter: StatusFilter) {
        debug!(filter = %filter, "Queue filter changed");
        self.apply(QueueEvent::FilterChanged(filter));
    }

    /// Copy of the whole controller state.
    pub fn snapshot(&self) -> QueueState {
        lock(&self.state).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationHandle;
    use crate::ticket::{Priority, SqliteTicketStore, TicketStatus};

    fn controller() -> (QueueController, tokio::sync::mpsc::Receiver<Notification>) {
        let store = SqliteTicketStore::in_memory().unwrap();
        store.seed_demo_tickets().unwrap();
        let (handle, rx) = NotificationHandle::channel(16);
        (
            QueueController::new(Arc::new(store), Arc::new(handle), "agent-1"),
            rx,
        )
    }

    #[tokio::test]
    async fn test_refresh_loads_store_tickets() {
        let (controller, _rx) = controller();
        let tickets = controller.refresh().await.unwrap();
        assert_eq!(tickets.len(), 3);
        assert_eq!(controller.all_tickets().len(), 3);
        assert!(controller.has_open_tickets());
    }

    #[tokio::test]
    async fn test_visible_tickets_are_ordered() {
        let (controller, _rx) = controller();
        controller.refresh().await.unwrap();
        let ids: Vec<String> = controller
            .visible_tickets()
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["ticket-1", "ticket-3", "ticket-2"]);
    }

    #[tokio::test]
    async fn test_full_lifecycle() {
        let (controller, mut rx) = controller();
        controller.refresh().await.unwrap();

        let receipt = controller.assign_next("agent-1").await.unwrap();
        assert_eq!(receipt.id, "ticket-1");
        assert_eq!(rx.recv().await.unwrap().message, ASSIGNED_NEXT);

        controller.resolve("ticket-1").await.unwrap();
        assert_eq!(rx.recv().await.unwrap().message, RESOLVED);

        let counts = controller.counts();
        assert_eq!(counts.resolved, 1);
        assert_eq!(counts.open, 2);
        assert!(controller.active_ticket_id().is_none());
    }

    #[tokio::test]
    async fn test_create_appends_after_existing() {
        let (controller, mut rx) = controller();
        controller.refresh().await.unwrap();

        let ticket = controller
            .create(CreateTicketRequest::new(
                "Printer on fire",
                "The third floor printer is literally on fire",
                Priority::Vip,
            ))
            .await
            .unwrap();

        assert_eq!(ticket.status, TicketStatus::Open);
        assert_eq!(controller.all_tickets().last().unwrap().id, ticket.id);
        assert_eq!(rx.recv().await.unwrap().message, CREATED);
    }

    #[tokio::test]
    async fn test_resolve_open_ticket_is_conflict() {
        let (controller, mut rx) = controller();
        controller.refresh().await.unwrap();

        let err = controller.resolve("ticket-2").await.unwrap_err();
        assert_eq!(err.kind(), "conflict");
        assert_eq!(controller.last_error(), Some(err.to_string()));
        assert!(rx.recv().await.unwrap().is_error());
        assert!(controller.active_ticket_id().is_none());
    }

    #[tokio::test]
    async fn test_filter_roundtrip() {
        let (controller, _rx) = controller();
        controller.refresh().await.unwrap();
        controller.assign("ticket-2", "agent-1").await.unwrap();

        controller.set_filter(StatusFilter::Only(TicketStatus::Assigned));
        assert_eq!(
            controller.filter(),
            StatusFilter::Only(TicketStatus::Assigned)
        );
        let visible = controller.visible_tickets();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "ticket-2");
        assert_eq!(controller.view(StatusFilter::All).len(), 3);
    }
}
