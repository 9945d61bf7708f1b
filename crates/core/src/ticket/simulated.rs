//! Store decorator that injects latency and transient assignment failures.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use super::{AssignReceipt, CreateTicketRequest, ResolveReceipt, Ticket, TicketError, TicketStore};
use crate::config::SimulationConfig;

/// Message returned for a simulated assignment failure.
pub const SIMULATED_ASSIGN_FAILURE: &str = "Assignment failed. Please try again.";

/// Wraps another store, delaying every call by a random amount and failing a
/// share of assign calls regardless of the ticket's state.
pub struct SimulatedStore<S> {
    inner: S,
    config: SimulationConfig,
}

impl<S: TicketStore> SimulatedStore<S> {
    pub fn new(inner: S, config: SimulationConfig) -> Self {
        Self { inner, config }
    }

    /// Access the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn delay(&self) {
        let millis = {
            let (min, max) = (self.config.min_delay_ms, self.config.max_delay_ms);
            if max == 0 {
                0
            } else {
                rand::thread_rng().gen_range(min.min(max)..=max)
            }
        };
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    fn should_fail(&self) -> bool {
        let rate = self.config.failure_rate.clamp(0.0, 1.0);
        rate > 0.0 && rand::thread_rng().gen_bool(rate)
    }
}

#[async_trait]
impl<S: TicketStore> TicketStore for SimulatedStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>, TicketError> {
        self.delay().await;
        self.inner.list_tickets().await
    }

    async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        self.delay().await;
        self.inner.create_ticket(request).await
    }

    async fn assign_ticket(
        &self,
        ticket_id: &str,
        assignee: &str,
    ) -> Result<AssignReceipt, TicketError> {
        self.delay().await;
        if self.should_fail() {
            tracing::debug!(ticket_id, "Simulating transient assignment failure");
            return Err(TicketError::Transient(SIMULATED_ASSIGN_FAILURE.to_string()));
        }
        self.inner.assign_ticket(ticket_id, assignee).await
    }

    async fn resolve_ticket(&self, ticket_id: &str) -> Result<ResolveReceipt, TicketError> {
        self.delay().await;
        self.inner.resolve_ticket(ticket_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::{Priority, SqliteTicketStore, TicketStatus};

    fn simulated(failure_rate: f64) -> SimulatedStore<SqliteTicketStore> {
        SimulatedStore::new(
            SqliteTicketStore::in_memory().unwrap(),
            SimulationConfig {
                failure_rate,
                min_delay_ms: 0,
                max_delay_ms: 0,
            },
        )
    }

    async fn open_ticket(store: &SimulatedStore<SqliteTicketStore>) -> Ticket {
        store
            .create_ticket(CreateTicketRequest::new(
                "Broken keyboard",
                "Several keys stopped working after coffee spill",
                Priority::Regular,
            ))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_always_failing_assign() {
        let store = simulated(1.0);
        let ticket = open_ticket(&store).await;

        for _ in 0..5 {
            let err = store.assign_ticket(&ticket.id, "agent-1").await.unwrap_err();
            assert_eq!(err, TicketError::Transient(SIMULATED_ASSIGN_FAILURE.to_string()));
        }

        let stored = store.inner().get(&ticket.id).unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn test_failure_applies_to_unknown_ticket_too() {
        let store = simulated(1.0);
        let err = store.assign_ticket("missing", "agent-1").await.unwrap_err();
        assert!(matches!(err, TicketError::Transient(_)));
    }

    #[tokio::test]
    async fn test_never_failing_assign() {
        let store = simulated(0.0);
        let ticket = open_ticket(&store).await;
        let receipt = store.assign_ticket(&ticket.id, "agent-1").await.unwrap();
        assert_eq!(receipt.status, TicketStatus::Assigned);
    }

    #[tokio::test]
    async fn test_resolve_is_never_simulated_to_fail() {
        let store = simulated(1.0);
        let ticket = open_ticket(&store).await;
        store.inner().assign_ticket(&ticket.id, "agent-1").await.unwrap();

        let receipt = store.resolve_ticket(&ticket.id).await.unwrap();
        assert_eq!(receipt.status, TicketStatus::Resolved);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_applied() {
        let store = SimulatedStore::new(
            SqliteTicketStore::in_memory().unwrap(),
            SimulationConfig {
                failure_rate: 0.0,
                min_delay_ms: 300,
                max_delay_ms: 800,
            },
        );

        let start = tokio::time::Instant::now();
        store.list_tickets().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed <= Duration::from_millis(800));
    }
}
