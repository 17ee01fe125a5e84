//! Streaming client for the `POST /v1/responses` gateway endpoint

use futures::StreamExt;

use crate::{
    error::{Error, Result},
    stream::ChunkStream,
    types::ResponsesRequest,
};

/// Default local gateway endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8081/v1/responses";

/// Gateway client
#[derive(Debug, Clone)]
pub struct ResponsesProvider {
    client: reqwest::Client,
    endpoint: String,
}

impl ResponsesProvider {
    /// Create a client for the given endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open a streamed call.
    ///
    /// Returns the raw body as a chunk stream once the gateway has answered
    /// with a 2xx status. Non-2xx answers become [`Error::Status`].
    pub async fn stream(
        &self,
        request: &ResponsesRequest,
        api_key: Option<&str>,
    ) -> Result<ChunkStream> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Accept", "text/event-stream")
            .json(request);

        if let Some(key) = api_key.filter(|k| !k.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        tracing::debug!(
            endpoint = %self.endpoint,
            model = %request.model,
            resumed = request.previous_response_id.is_some(),
            "Opening responses stream"
        );

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Gateway rejected request");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        if response.content_length() == Some(0) {
            return Err(Error::MissingBody);
        }

        Ok(Box::pin(
            response.bytes_stream().map(|chunk| chunk.map_err(Error::from)),
        ))
    }
}
