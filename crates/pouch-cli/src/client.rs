//! HTTP transport for the remote wallet service
//!
//! One form-encoded POST per operation at `<endpoint>/<Operation>`, bearer
//! token in the Authorization header for authenticated calls. The response
//! body is the XML envelope; parsing it belongs to the core crate. No
//! retries — a failed round trip aborts the current command.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use pouch_core::{Error, Result, RpcCall, Transport};

pub struct HttpTransport {
    http: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, call: &RpcCall) -> Result<String> {
        let url = format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            call.operation
        );
        debug!(%url, "sending request");

        let mut request = self.http.post(&url).form(&call.params);
        if let Some(token) = &call.bearer {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Transport(format!(
                "{} returned HTTP {status}",
                call.operation
            )));
        }
        debug!(operation = call.operation, bytes = body.len(), "response received");
        Ok(body)
    }
}
