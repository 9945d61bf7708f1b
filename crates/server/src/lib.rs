//! HTTP service for the support ticket queue.
//!
//! Serves the ticket store API, the agent queue API, WebSocket notifications
//! and Prometheus metrics.

pub mod api;
pub mod metrics;
pub mod state;
