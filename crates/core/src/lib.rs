pub mod config;
pub mod metrics;
pub mod notify;
pub mod queue;
pub mod testing;
pub mod ticket;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
    StoreBackend,
};
pub use notify::{Notification, NotificationHandle, NotificationLevel, Notifier, TracingNotifier};
pub use queue::{QueueController, QueueError, StatusCounts, StatusFilter};
pub use ticket::{
    AssignReceipt, CreateTicketRequest, HttpTicketStore, Priority, ResolveReceipt,
    SimulatedStore, SqliteTicketStore, Ticket, TicketError, TicketStatus, TicketStore,
};
