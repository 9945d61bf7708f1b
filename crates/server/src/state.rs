use std::sync::Arc;
use supportq_core::{Config, QueueController, SanitizedConfig, TicketStore};

use crate::api::WsBroadcaster;

/// Shared application state
pub struct AppState {
    config: Config,
    /// Store served by the `/tickets` API.
    ticket_store: Arc<dyn TicketStore>,
    /// Agent queue, backed by the local store or a remote ticket service.
    queue: Arc<QueueController>,
    ws_broadcaster: WsBroadcaster,
}

impl AppState {
    pub fn new(
        config: Config,
        ticket_store: Arc<dyn TicketStore>,
        queue: Arc<QueueController>,
        ws_broadcaster: WsBroadcaster,
    ) -> Self {
        Self {
            config,
            ticket_store,
            queue,
            ws_broadcaster,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    pub fn queue(&self) -> &QueueController {
        &self.queue
    }

    pub fn ws_broadcaster(&self) -> &WsBroadcaster {
        &self.ws_broadcaster
    }
}
