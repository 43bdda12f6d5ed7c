//! Reqwest-based HTTP transport implementation.

use super::http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::TransportError;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;

/// Reqwest-based HTTP transport.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a new reqwest transport with the given timeouts.
    pub fn new(timeout: Duration, connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    fn convert_headers(headers: HashMap<String, String>) -> reqwest::header::HeaderMap {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in headers {
            if let (Ok(name), Ok(val)) = (
                reqwest::header::HeaderName::from_bytes(key.as_bytes()),
                reqwest::header::HeaderValue::from_str(&value),
            ) {
                header_map.insert(name, val);
            }
        }
        header_map
    }

    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect()
    }

    fn map_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut req_builder = self
            .client
            .request(Self::convert_method(request.method), &request.url)
            .headers(Self::convert_headers(request.headers));

        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let headers = Self::extract_headers(response.headers());
        let body = response.bytes().await.map_err(|e| self.map_error(e))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_transport_creation() {
        let transport = ReqwestTransport::new(Duration::from_secs(30), Duration::from_secs(10));
        assert!(transport.is_ok());
    }

    #[tokio::test]
    async fn test_refused_connection_maps_to_transport_error() {
        let transport =
            ReqwestTransport::new(Duration::from_secs(2), Duration::from_secs(1)).unwrap();
        let request = HttpRequest {
            method: HttpMethod::Get,
            url: "http://127.0.0.1:1/".to_string(),
            headers: HashMap::new(),
            body: None,
        };
        let err = transport.send(request).await.unwrap_err();
        assert!(matches!(
            err,
            TransportError::Connection(_) | TransportError::Timeout(_)
        ));
    }
}
