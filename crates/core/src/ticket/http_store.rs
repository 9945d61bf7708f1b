//! Ticket store client for a remote ticket service over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::{AssignReceipt, CreateTicketRequest, ResolveReceipt, Ticket, TicketError, TicketStore};
use crate::config::RemoteStoreConfig;

const FETCH_FAILED: &str = "Failed to fetch tickets";
const CREATE_FAILED: &str = "Failed to create ticket";
const ASSIGN_FAILED: &str = "Failed to assign ticket";
const RESOLVE_FAILED: &str = "Failed to resolve ticket";

#[derive(Debug, Deserialize)]
struct TicketList {
    tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize)]
struct AssignBody<'a> {
    assignee: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// Remote ticket store speaking the `/tickets` HTTP API.
pub struct HttpTicketStore {
    client: Client,
    base_url: String,
}

impl HttpTicketStore {
    /// Create a new client. `config.url` is the API base, e.g. `http://host:8080/api/v1`.
    pub fn new(config: &RemoteStoreConfig) -> Result<Self, TicketError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| TicketError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// URL for an action on one ticket. The id is percent-encoded so it
    /// always stays a single path segment.
    fn ticket_url(&self, ticket_id: &str, action: &str) -> String {
        self.url(&format!(
            "/tickets/{}/{}",
            urlencoding::encode(ticket_id),
            action
        ))
    }

    /// Turn a non-success response into a store error, keeping the server's
    /// message when it sent one.
    async fn error_from(response: Response, fallback: &str) -> TicketError {
        let status = response.status();
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error)
            .filter(|msg| !msg.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string());

        match status {
            StatusCode::NOT_FOUND => TicketError::NotFound(message),
            StatusCode::CONFLICT => TicketError::Conflict(message),
            _ => TicketError::Transient(message),
        }
    }

    fn transport_error(e: reqwest::Error, fallback: &str) -> TicketError {
        tracing::warn!(error = %e, "Ticket service request failed");
        TicketError::Transient(fallback.to_string())
    }
}

#[async_trait]
impl TicketStore for HttpTicketStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn list_tickets(&self) -> Result<Vec<Ticket>, TicketError> {
        let response = self
            .client
            .get(self.url("/tickets"))
            .send()
            .await
            .map_err(|e| Self::transport_error(e, FETCH_FAILED))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, FETCH_FAILED).await);
        }

        let list: TicketList = response
            .json()
            .await
            .map_err(|e| TicketError::Http(e.to_string()))?;
        Ok(list.tickets)
    }

    async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Ticket, TicketError> {
        let response = self
            .client
            .post(self.url("/tickets"))
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::transport_error(e, CREATE_FAILED))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, CREATE_FAILED).await);
        }

        response
            .json()
            .await
            .map_err(|e| TicketError::Http(e.to_string()))
    }

    async fn assign_ticket(
        &self,
        ticket_id: &str,
        assignee: &str,
    ) -> Result<AssignReceipt, TicketError> {
        let response = self
            .client
            .post(self.ticket_url(ticket_id, "assign"))
            .json(&AssignBody { assignee })
            .send()
            .await
            .map_err(|e| Self::transport_error(e, ASSIGN_FAILED))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, ASSIGN_FAILED).await);
        }

        response
            .json()
            .await
            .map_err(|e| TicketError::Http(e.to_string()))
    }

    async fn resolve_ticket(&self, ticket_id: &str) -> Result<ResolveReceipt, TicketError> {
        let response = self
            .client
            .post(self.ticket_url(ticket_id, "resolve"))
            .send()
            .await
            .map_err(|e| Self::transport_error(e, RESOLVE_FAILED))?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, RESOLVE_FAILED).await);
        }

        response
            .json()
            .await
            .map_err(|e| TicketError::Http(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let store = HttpTicketStore::new(&RemoteStoreConfig {
            url: "http://localhost:8080/api/v1/".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            store.url("/tickets"),
            "http://localhost:8080/api/v1/tickets"
        );
    }

    #[test]
    fn test_ticket_id_is_a_single_path_segment() {
        let store = HttpTicketStore::new(&RemoteStoreConfig {
            url: "http://localhost:8080/api/v1".to_string(),
            timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            store.ticket_url("ticket-1/resolve?x=", "assign"),
            "http://localhost:8080/api/v1/tickets/ticket-1%2Fresolve%3Fx%3D/assign"
        );
        assert_eq!(
            store.ticket_url("ticket-1", "resolve"),
            "http://localhost:8080/api/v1/tickets/ticket-1/resolve"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient() {
        // Port 9 (discard) on localhost is not expected to run an HTTP server.
        let store = HttpTicketStore::new(&RemoteStoreConfig {
            url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
        })
        .unwrap();

        let err = store.list_tickets().await.unwrap_err();
        assert_eq!(err, TicketError::Transient(FETCH_FAILED.to_string()));
    }
}
