//! Transport seam between the call driver and the network

use async_trait::async_trait;
use snowball_ai::{ChunkStream, ResponsesRequest, Result, providers::ResponsesProvider};

/// Opens a streamed gateway call and hands back the raw body
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, request: &ResponsesRequest, api_key: Option<&str>) -> Result<ChunkStream>;
}

/// HTTP transport backed by [`ResponsesProvider`]
#[derive(Debug, Clone)]
pub struct HttpTransport {
    provider: ResponsesProvider,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            provider: ResponsesProvider::new(endpoint),
        }
    }

    pub fn endpoint(&self) -> &str {
        self.provider.endpoint()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, request: &ResponsesRequest, api_key: Option<&str>) -> Result<ChunkStream> {
        self.provider.stream(request, api_key).await
    }
}
