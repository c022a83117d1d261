use async_trait::async_trait;
use reqwest::Client;
use std::{error::Error as StdError, fmt::Debug, sync::Arc};
use thiserror::Error;
use tracing::debug;

use crate::request::QueryDescriptor;

/// Status and raw body of an HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, body: body.into() }
    }
}

/// No response could be obtained (connect, TLS, timeout, body read).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), source: None }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self { message: message.into(), source: Some(Box::new(source)) }
    }
}

/// Anything that can execute a [`QueryDescriptor`].
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn send(&self, request: &QueryDescriptor) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &QueryDescriptor) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self { http: Client::new() }
    }

    /// Use a preconfigured client (timeouts, proxies, user agent).
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &QueryDescriptor) -> Result<TransportResponse, TransportError> {
        let mut builder = self.http.get(request.url().clone());
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let res = builder
            .send()
            .await
            .map_err(|e| TransportError::with_source("Failed to send request to Storm Glass", e))?;

        let status = res.status().as_u16();
        let body = res
            .bytes()
            .await
            .map_err(|e| TransportError::with_source("Failed to read Storm Glass response body", e))?;

        debug!(status, bytes = body.len(), "received Storm Glass response");

        Ok(TransportResponse { status, body: body.to_vec() })
    }
}
