//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Queue controller actions (outcomes, guard rejections)
//! - Ticket store calls (latency by backend and operation)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Queue Controller
// =============================================================================

/// Queue actions total by action and result.
pub static QUEUE_ACTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("supportq_queue_actions_total", "Total queue controller actions"),
        &["action", "result"], // action: "create", "assign", "assign_next", "resolve", "refresh"
    )
    .unwrap()
});

/// Assign/resolve calls rejected because another action was in flight.
pub static GUARD_REJECTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "supportq_guard_rejections_total",
        "Actions rejected while another action was in flight",
    )
    .unwrap()
});

/// AssignNext calls that found no open ticket.
pub static QUEUE_EMPTY: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "supportq_assign_next_empty_total",
        "Assign-next calls that found no open ticket",
    )
    .unwrap()
});

// =============================================================================
// Ticket Store
// =============================================================================

/// Store call duration in seconds.
pub static STORE_CALL_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "supportq_store_call_duration_seconds",
            "Duration of ticket store calls",
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["store", "operation"],
    )
    .unwrap()
});

/// Store call errors by store and error kind.
pub static STORE_CALL_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("supportq_store_call_errors_total", "Failed ticket store calls"),
        &["store", "operation", "kind"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

/// All core metrics, for registration with the server's registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(QUEUE_ACTIONS.clone()),
        Box::new(GUARD_REJECTIONS.clone()),
        Box::new(QUEUE_EMPTY.clone()),
        Box::new(STORE_CALL_DURATION.clone()),
        Box::new(STORE_CALL_ERRORS.clone()),
    ]
}
