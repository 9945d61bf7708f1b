//! Controller state and its transition function.

use crate::ticket::{Ticket, TicketStatus};

use super::engine::StatusFilter;

/// Everything the queue controller knows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueState {
    /// Authoritative ticket collection, in store arrival order.
    pub tickets: Vec<Ticket>,
    /// Ticket of the single outstanding assign/resolve action.
    pub active_ticket_id: Option<String>,
    pub last_error: Option<String>,
    pub filter: StatusFilter,
}

/// A discrete state change.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    /// The store's full ticket list replaced the collection.
    Loaded(Vec<Ticket>),
    /// The store created a ticket.
    Created(Ticket),
    /// An assign/resolve action took the in-flight slot.
    ActionStarted { ticket_id: String },
    /// The in-flight slot was released.
    ActionEnded,
    /// The store confirmed an assignment.
    Assigned { ticket_id: String, assignee: String },
    /// The store confirmed a resolution.
    Resolved { ticket_id: String },
    /// An action failed.
    Failed(String),
    ErrorCleared,
    FilterChanged(StatusFilter),
}

impl QueueState {
    /// Apply one event.
    ///
    /// Confirmations for tickets that are no longer in the collection are
    /// ignored; nothing is ever removed from the collection.
    pub fn apply(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::Loaded(tickets) => {
                self.tickets = tickets;
            }
            QueueEvent::Created(ticket) => {
                self.tickets.push(ticket);
            }
            QueueEvent::ActionStarted { ticket_id } => {
                self.active_ticket_id = Some(ticket_id);
                self.last_error = None;
            }
            QueueEvent::ActionEnded => {
                self.active_ticket_id = None;
            }
            QueueEvent::Assigned {
                ticket_id,
                assignee,
            } => {
                if let Some(ticket) = self.find_mut(&ticket_id) {
                    ticket.status = TicketStatus::Assigned;
                    ticket.assignee = Some(assignee);
                }
            }
            QueueEvent::Resolved { ticket_id } => {
                if let Some(ticket) = self.find_mut(&ticket_id) {
                    ticket.status = TicketStatus::Resolved;
                }
            }
            QueueEvent::Failed(message) => {
                self.last_error = Some(message);
            }
            QueueEvent::ErrorCleared => {
                self.last_error = None;
            }
            QueueEvent::FilterChanged(filter) => {
                self.filter = filter;
            }
        }
    }

    /// Pure form of [`QueueState::apply`].
    pub fn reduce(mut self, event: QueueEvent) -> Self {
        self.apply(event);
        self
    }

    pub fn find(&self, ticket_id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == ticket_id)
    }

    fn find_mut(&mut self, ticket_id: &str) -> Option<&mut Ticket> {
        self.tickets.iter_mut().find(|t| t.id == ticket_id)
    }
}
