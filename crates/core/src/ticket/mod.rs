//! Tickets, their lifecycle, and the stores that hold them.

mod http_store;
mod simulated;
mod sqlite_store;
mod store;
mod types;
mod validate;

pub use http_store::HttpTicketStore;
pub use simulated::{SimulatedStore, SIMULATED_ASSIGN_FAILURE};
pub use sqlite_store::{demo_tickets, SqliteTicketStore};
pub use store::{TicketError, TicketStore};
pub use types::{
    AssignReceipt, CreateTicketRequest, Priority, ResolveReceipt, Ticket, TicketStatus,
};
pub use validate::{
    validate_create_request, ValidationErrors, DESCRIPTION_MAX, DESCRIPTION_MIN, TITLE_MAX,
    TITLE_MIN,
};
