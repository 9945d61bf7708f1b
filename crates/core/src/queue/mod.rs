//! The agent work queue.
//!
//! [`engine`] decides ordering and the next eligible ticket; it is pure and
//! never fails. [`QueueController`] owns the local collection and drives the
//! ticket lifecycle through a [`TicketStore`](crate::ticket::TicketStore).

mod controller;
pub mod engine;
mod error;
mod state;

pub use controller::QueueController;
pub use engine::{count_by_status, filter_view, next_eligible, order, StatusCounts, StatusFilter};
pub use error::{QueueError, NO_OPEN_TICKETS};
pub use state::{QueueEvent, QueueState};
