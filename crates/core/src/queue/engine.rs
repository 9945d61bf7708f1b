//! Queue ordering and next-ticket selection.
//!
//! Pure functions over a snapshot of tickets: no I/O, no state, deterministic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ticket::{Ticket, TicketStatus};

/// Status filter for a queue view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TicketStatus),
}

impl StatusFilter {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(status) => ticket.status == *status,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Only(status) => status.as_str(),
        }
    }
}

impl From<TicketStatus> for StatusFilter {
    fn from(status: TicketStatus) -> Self {
        StatusFilter::Only(status)
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse::<TicketStatus>().map(StatusFilter::Only)
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StatusFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Ticket counts per status over an unfiltered collection.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub all: usize,
    pub open: usize,
    pub assigned: usize,
    pub resolved: usize,
}

impl StatusCounts {
    pub fn get(&self, filter: StatusFilter) -> usize {
        match filter {
            StatusFilter::All => self.all,
            StatusFilter::Only(TicketStatus::Open) => self.open,
            StatusFilter::Only(TicketStatus::Assigned) => self.assigned,
            StatusFilter::Only(TicketStatus::Resolved) => self.resolved,
        }
    }
}

/// Order tickets for service: every VIP ticket before every Regular ticket,
/// oldest first within a class.
///
/// The sort is stable, so tickets with equal `created_at` keep their input order.
pub fn order(tickets: &[Ticket]) -> Vec<Ticket> {
    let mut sorted = tickets.to_vec();
    sorted.sort_by(|a, b| {
        a.priority
            .rank()
            .cmp(&b.priority.rank())
            .then_with(|| a.created_at.cmp(&b.created_at))
    });
    sorted
}

/// The first Open ticket in queue order, if any.
pub fn next_eligible(tickets: &[Ticket]) -> Option<Ticket> {
    order(tickets)
        .into_iter()
        .find(|ticket| ticket.status.is_eligible())
}

/// Filter by status, then order.
pub fn filter_view(tickets: &[Ticket], filter: StatusFilter) -> Vec<Ticket> {
    let matching: Vec<Ticket> = tickets
        .iter()
        .filter(|ticket| filter.matches(ticket))
        .cloned()
        .collect();
    order(&matching)
}

pub fn count_by_status(tickets: &[Ticket]) -> StatusCounts {
    tickets.iter().fold(
        StatusCounts {
            all: tickets.len(),
            ..StatusCounts::default()
        },
        |mut counts, ticket| {
            match ticket.status {
                TicketStatus::Open => counts.open += 1,
                TicketStatus::Assigned => counts.assigned += 1,
                TicketStatus::Resolved => counts.resolved += 1,
            }
            counts
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticket::Priority;
    use chrono::{DateTime, TimeZone, Utc};
    use proptest::prelude::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ticket(id: &str, priority: Priority, status: TicketStatus, created_at: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            title: "Test Ticket".to_string(),
            description: "Test description for the ticket".to_string(),
            priority,
            status,
            created_at: at(created_at),
            assignee: match status {
                TicketStatus::Open => None,
                _ => Some("agent-1".to_string()),
            },
        }
    }

    fn ids(tickets: &[Ticket]) -> Vec<&str> {
        tickets.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_vip_before_regular() {
        let tickets = vec![
            ticket("1", Priority::Regular, TicketStatus::Open, "2024-01-15T09:00:00Z"),
            ticket("2", Priority::Vip, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("3", Priority::Regular, TicketStatus::Open, "2024-01-15T08:00:00Z"),
        ];

        let sorted = order(&tickets);
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
        assert_eq!(sorted[0].priority, Priority::Vip);
    }

    #[test]
    fn test_fifo_within_priority() {
        let tickets = vec![
            ticket("1", Priority::Vip, TicketStatus::Open, "2024-01-15T10:30:00Z"),
            ticket("2", Priority::Vip, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("3", Priority::Vip, TicketStatus::Open, "2024-01-15T10:15:00Z"),
        ];

        assert_eq!(ids(&order(&tickets)), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_mixed_priorities_with_fifo() {
        let tickets = vec![
            ticket("1", Priority::Vip, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("2", Priority::Regular, TicketStatus::Open, "2024-01-15T09:00:00Z"),
            ticket("3", Priority::Vip, TicketStatus::Open, "2024-01-15T10:15:00Z"),
            ticket("4", Priority::Regular, TicketStatus::Open, "2024-01-15T09:30:00Z"),
            ticket("5", Priority::Vip, TicketStatus::Open, "2024-01-15T10:30:00Z"),
            ticket("6", Priority::Regular, TicketStatus::Open, "2024-01-15T11:00:00Z"),
        ];

        assert_eq!(
            ids(&order(&tickets)),
            vec!["1", "3", "5", "2", "4", "6"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(order(&[]).is_empty());
        assert!(next_eligible(&[]).is_none());
    }

    #[test]
    fn test_single_ticket() {
        let tickets = vec![ticket(
            "1",
            Priority::Regular,
            TicketStatus::Open,
            "2024-01-15T10:00:00Z",
        )];
        let sorted = order(&tickets);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].id, "1");
    }

    #[test]
    fn test_ties_keep_input_order() {
        let tickets = vec![
            ticket("b", Priority::Regular, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("a", Priority::Regular, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("c", Priority::Regular, TicketStatus::Open, "2024-01-15T10:00:00Z"),
        ];
        assert_eq!(ids(&order(&tickets)), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_next_eligible_first_vip_open() {
        let tickets = vec![
            ticket("1", Priority::Regular, TicketStatus::Open, "2024-01-15T09:00:00Z"),
            ticket("2", Priority::Vip, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("3", Priority::Vip, TicketStatus::Open, "2024-01-15T10:30:00Z"),
        ];

        let next = next_eligible(&tickets).unwrap();
        assert_eq!(next.id, "2");
        assert_eq!(next.priority, Priority::Vip);
    }

    #[test]
    fn test_next_eligible_falls_back_to_regular() {
        let tickets = vec![
            ticket("1", Priority::Vip, TicketStatus::Assigned, "2024-01-15T10:00:00Z"),
            ticket("2", Priority::Regular, TicketStatus::Open, "2024-01-15T09:30:00Z"),
            ticket("3", Priority::Regular, TicketStatus::Open, "2024-01-15T09:00:00Z"),
        ];

        let next = next_eligible(&tickets).unwrap();
        assert_eq!(next.id, "3");
        assert_eq!(next.priority, Priority::Regular);
    }

    #[test]
    fn test_next_eligible_none_when_nothing_open() {
        let tickets = vec![
            ticket("1", Priority::Vip, TicketStatus::Assigned, "2024-01-15T10:00:00Z"),
            ticket("2", Priority::Regular, TicketStatus::Resolved, "2024-01-15T09:00:00Z"),
        ];
        assert!(next_eligible(&tickets).is_none());
    }

    #[test]
    fn test_next_eligible_skips_assigned_and_resolved() {
        let tickets = vec![
            ticket("1", Priority::Vip, TicketStatus::Resolved, "2024-01-15T08:00:00Z"),
            ticket("2", Priority::Vip, TicketStatus::Assigned, "2024-01-15T09:00:00Z"),
            ticket("3", Priority::Vip, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("4", Priority::Regular, TicketStatus::Open, "2024-01-15T07:00:00Z"),
        ];

        let next = next_eligible(&tickets).unwrap();
        assert_eq!(next.id, "3");
        assert_eq!(next.status, TicketStatus::Open);
    }

    #[test]
    fn test_filter_view_orders_filtered_subset() {
        let tickets = vec![
            ticket("1", Priority::Regular, TicketStatus::Open, "2024-01-15T08:00:00Z"),
            ticket("2", Priority::Vip, TicketStatus::Assigned, "2024-01-15T09:00:00Z"),
            ticket("3", Priority::Vip, TicketStatus::Open, "2024-01-15T10:00:00Z"),
        ];

        let open = filter_view(&tickets, StatusFilter::Only(TicketStatus::Open));
        assert_eq!(ids(&open), vec!["3", "1"]);

        let all = filter_view(&tickets, StatusFilter::All);
        assert_eq!(ids(&all), vec!["2", "3", "1"]);

        let resolved = filter_view(&tickets, TicketStatus::Resolved.into());
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_count_by_status() {
        let tickets = vec![
            ticket("1", Priority::Regular, TicketStatus::Open, "2024-01-15T08:00:00Z"),
            ticket("2", Priority::Vip, TicketStatus::Assigned, "2024-01-15T09:00:00Z"),
            ticket("3", Priority::Vip, TicketStatus::Open, "2024-01-15T10:00:00Z"),
            ticket("4", Priority::Vip, TicketStatus::Resolved, "2024-01-15T11:00:00Z"),
        ];

        let counts = count_by_status(&tickets);
        assert_eq!(
            counts,
            StatusCounts {
                all: 4,
                open: 2,
                assigned: 1,
                resolved: 1,
            }
        );
        assert_eq!(counts.get(StatusFilter::Only(TicketStatus::Open)), 2);
        assert_eq!(counts.get(StatusFilter::All), 4);
    }

    #[test]
    fn test_status_filter_parse_and_serialize() {
        assert_eq!("all".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "open".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(TicketStatus::Open)
        );
        assert!("pending".parse::<StatusFilter>().is_err());

        let json = serde_json::to_string(&StatusFilter::Only(TicketStatus::Assigned)).unwrap();
        assert_eq!(json, "\"Assigned\"");
        let parsed: StatusFilter = serde_json::from_str("\"Resolved\"").unwrap();
        assert_eq!(parsed, StatusFilter::Only(TicketStatus::Resolved));
    }

    // ------------------------------------------------------------------------
    // Properties
    // ------------------------------------------------------------------------

    fn arb_ticket() -> impl Strategy<Value = (bool, u8, u8)> {
        // (is_vip, minute offset, status index); small minute range forces ties
        (any::<bool>(), 0u8..6, 0u8..3)
    }

    fn build(specs: &[(bool, u8, u8)]) -> Vec<Ticket> {
        let base = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        specs
            .iter()
            .enumerate()
            .map(|(i, (vip, minute, status))| {
                let status = TicketStatus::ALL[*status as usize];
                Ticket {
                    id: format!("t{}", i),
                    title: "Generated".to_string(),
                    description: "Generated ticket for ordering properties".to_string(),
                    priority: if *vip { Priority::Vip } else { Priority::Regular },
                    status,
                    created_at: base + chrono::Duration::minutes(*minute as i64),
                    assignee: (status != TicketStatus::Open).then(|| "agent-1".to_string()),
                }
            })
            .collect()
    }

    proptest! {
        #[test]
        fn prop_vip_block_then_fifo(specs in proptest::collection::vec(arb_ticket(), 0..40)) {
            let tickets = build(&specs);
            let sorted = order(&tickets);

            prop_assert_eq!(sorted.len(), tickets.len());

            let first_regular = sorted
                .iter()
                .position(|t| t.priority == Priority::Regular)
                .unwrap_or(sorted.len());
            prop_assert!(sorted[first_regular..].iter().all(|t| t.priority == Priority::Regular));

            for pair in sorted.windows(2) {
                if pair[0].priority == pair[1].priority {
                    prop_assert!(pair[0].created_at <= pair[1].created_at);
                }
            }
        }

        #[test]
        fn prop_order_is_permutation(specs in proptest::collection::vec(arb_ticket(), 0..40)) {
            let tickets = build(&specs);
            let mut before: Vec<String> = tickets.iter().map(|t| t.id.clone()).collect();
            let mut after: Vec<String> = order(&tickets).into_iter().map(|t| t.id).collect();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn prop_order_is_stable(specs in proptest::collection::vec(arb_ticket(), 0..40)) {
            let tickets = build(&specs);
            let position = |id: &str| tickets.iter().position(|t| t.id == id).unwrap();
            let sorted = order(&tickets);

            for pair in sorted.windows(2) {
                if pair[0].priority == pair[1].priority && pair[0].created_at == pair[1].created_at {
                    prop_assert!(position(&pair[0].id) < position(&pair[1].id));
                }
            }
        }

        #[test]
        fn prop_order_is_idempotent(specs in proptest::collection::vec(arb_ticket(), 0..40)) {
            let tickets = build(&specs);
            let once = order(&tickets);
            let twice = order(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_next_eligible_is_first_open(specs in proptest::collection::vec(arb_ticket(), 0..40)) {
            let tickets = build(&specs);
            // min_by_key keeps the first of equal minima, matching the stable sort
            let expected = tickets
                .iter()
                .filter(|t| t.status == TicketStatus::Open)
                .min_by_key(|t| (t.priority.rank(), t.created_at))
                .cloned();
            prop_assert_eq!(next_eligible(&tickets), expected.clone());

            if tickets.iter().all(|t| t.status != TicketStatus::Open) {
                prop_assert!(expected.is_none());
            }
        }
    }
}
