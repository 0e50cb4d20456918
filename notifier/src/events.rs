use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// The entire event delivery (connect, send, response) must finish within
/// this window; the database service is expected to answer well within it.
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum EventDeliveryError {
    #[error("database request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("database responded with status {0}")]
    ErrorStatus(reqwest::StatusCode),
}

/// Event record accepted by the database service's `/events` endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EventRecord {
    pub source: String,
    pub method: String,
    pub route: String,
    pub status: u16,
    pub message: String,
}

/// Client for the database service's event-ingestion endpoint.
#[derive(Clone)]
pub struct DatabaseClient {
    client: reqwest::Client,
    events_url: String,
}

impl DatabaseClient {
    /// `database_url` is the base URL of the database service without a
    /// trailing slash.
    pub fn new(database_url: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(EVENT_TIMEOUT).build()?;

        Ok(DatabaseClient {
            client,
            events_url: format!("{database_url}/events"),
        })
    }

    /// Send one event downstream. Any non-2xx response is a delivery failure;
    /// there are no retries, so a duplicate caller retry produces a duplicate
    /// event.
    pub async fn record_event(&self, event: &EventRecord) -> Result<(), EventDeliveryError> {
        let response = self.client.post(&self.events_url).json(event).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EventDeliveryError::ErrorStatus(status));
        }

        Ok(())
    }
}
