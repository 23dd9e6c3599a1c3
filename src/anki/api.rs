use std::time::Duration;

use reqwest::Client;
use serde::{
    de::DeserializeOwned,
    Deserialize,
    Serialize,
};
use tokio::time::sleep;

use crate::{
    core::KikuError,
    notes::Note,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// A non-null `error` is always a failure; a null `result` is empty.
    pub fn into_result(self) -> Result<Option<T>, KikuError> {
        match self.error {
            Some(error) => Err(KikuError::AnkiConnect(error)),
            None => Ok(self.result),
        }
    }
}

/// Client for the AnkiConnect add-on's local HTTP API.
#[derive(Debug, Clone)]
pub struct AnkiConnect {
    address: String,
    client: Client,
}

impl AnkiConnect {
    pub fn new(address: impl Into<String>) -> Self {
        Self { address: address.into(), client: Client::new() }
    }

    pub fn on_port(port: u16) -> Self {
        Self::new(format!("http://127.0.0.1:{}", port))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    async fn make_request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<Option<T>, KikuError> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
        body.insert("version".to_string(), serde_json::Value::Number((6).into()));

        if let Some(params) = params {
            body.insert("params".to_string(), params);
        }

        tracing::trace!(action, address = %self.address, "AnkiConnect request");
        let response: ApiResponse<T> =
            self.client.post(&self.address).json(&body).send().await?.json().await?;

        response.into_result()
    }

    pub async fn get_version(&self) -> Result<u32, KikuError> {
        Ok(self.make_request("version", None).await?.unwrap_or_default())
    }

    pub async fn get_active_profile(&self) -> Result<String, KikuError> {
        self.make_request("getActiveProfile", None)
            .await?
            .ok_or_else(|| KikuError::AnkiConnect("no active profile".to_string()))
    }

    pub async fn find_notes(&self, query: &str) -> Result<Vec<u64>, KikuError> {
        let params = serde_json::json!({ "query": query });
        Ok(self.make_request("findNotes", Some(params)).await?.unwrap_or_default())
    }

    pub async fn notes_info(&self, note_ids: &[u64]) -> Result<Vec<Note>, KikuError> {
        let params = serde_json::json!({ "notes": note_ids });
        Ok(self.make_request("notesInfo", Some(params)).await?.unwrap_or_default())
    }

    /// Runs `query` and returns the full notes, or nothing without a second
    /// round trip when no note matches.
    pub async fn find_notes_info(&self, query: &str) -> Result<Vec<Note>, KikuError> {
        let ids = self.find_notes(query).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.notes_info(&ids).await
    }

    /// Polls `version` until AnkiConnect answers.
    pub async fn wait_awake(&self, wait_time: u64, max_attempts: u32) -> bool {
        for attempt in 1..=max_attempts {
            match self.get_version().await {
                Ok(version) => {
                    tracing::info!(version, "AnkiConnect is online");
                    return true;
                }
                Err(err) => {
                    tracing::warn!(
                        "AnkiConnect attempt {} of {} failed. Retrying in {} seconds... Error: {}",
                        attempt,
                        max_attempts,
                        wait_time,
                        err
                    );
                    if attempt < max_attempts {
                        sleep(Duration::from_secs(wait_time)).await;
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers,
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;

    #[tokio::test]
    async fn test_request_envelope_and_result() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_json(serde_json::json!({
                "action": "findNotes",
                "version": 6,
                "params": { "query": "deck:*" }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "result": [1, 2], "error": null })),
            )
            .mount(&server)
            .await;

        let anki = AnkiConnect::new(server.uri());
        assert_eq!(anki.find_notes("deck:*").await.unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_error_envelope_is_failure() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({ "result": null, "error": "collection is not available" }),
            ))
            .mount(&server)
            .await;

        let anki = AnkiConnect::new(server.uri());
        let err = anki.find_notes("deck:*").await.unwrap_err();
        assert!(matches!(err, KikuError::AnkiConnect(ref msg) if msg == "collection is not available"));
        assert!(!anki.wait_awake(0, 1).await);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        // Nothing listens on port 9 on loopback.
        let anki = AnkiConnect::on_port(9);
        assert!(anki.get_version().await.is_err());
    }
}
