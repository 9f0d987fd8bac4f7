//! HTTP client for the batch ("lote") API.
//!
//! Three calls, no retries, no cache:
//!
//! | Method                 | Request                 |
//! |------------------------|-------------------------|
//! | [`LoteApi::list`]      | `GET /lotes`            |
//! | [`LoteApi::create`]    | `POST /lotes`           |
//! | [`LoteApi::delete`]    | `DELETE /lotes/{codigo}`|
//!
//! Every failure (unreachable host, timeout, non-2xx status, undecodable
//! body) is a [`TransportError`]. Callers decide what to do with it.
//!
//! # Usage
//!
//! ```ignore
//! use agromark_client::{LoteApi, LoteClient};
//!
//! let client = LoteClient::new("http://192.168.31.2:6933")?;
//! let lotes = client.list().await?;
//! ```

use std::time::Duration;

use agromark_types::{Codigo, Lote, NewLote};
use reqwest::Url;

// ── Error ───────────────────────────────────────────────────────────

/// Any failure talking to the batch API.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Server answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// Connection refused, DNS failure, timeout, TLS failure...
    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body was not the expected JSON.
    #[error("decode: {0}")]
    Decode(String),

    /// Base URL cannot address the API.
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    /// HTTP status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            TransportError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Network(e) if e.is_timeout())
    }
}

// ── LoteApi ─────────────────────────────────────────────────────────

/// Remote batch operations. [`LoteClient`] is the HTTP implementation;
/// controllers only see this trait.
#[async_trait::async_trait]
pub trait LoteApi: Send + Sync + 'static {
    /// Fetch the full collection, in server order.
    async fn list(&self) -> Result<Vec<Lote>, TransportError>;

    /// Create a batch. Returns the created batch when the server echoes it.
    async fn create(&self, lote: &NewLote) -> Result<Option<Lote>, TransportError>;

    /// Delete a batch by code. Unknown codes fail with the server's status.
    async fn delete(&self, codigo: &Codigo) -> Result<(), TransportError>;
}

// ── LoteClient ──────────────────────────────────────────────────────

/// reqwest-backed [`LoteApi`].
pub struct LoteClient {
    http: reqwest::Client,
    base_url: Url,
}

impl LoteClient {
    /// Client using reqwest's default timeouts.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_timeout(base_url, None)
    }

    /// Client with an optional per-request timeout.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(TransportError::InvalidUrl(base_url.to_string()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `{base}/lotes`, or `{base}/lotes/{codigo}` with the code encoded as
    /// a single path segment.
    fn url(&self, codigo: Option<&Codigo>) -> Result<Url, TransportError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| TransportError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push("lotes");
            if let Some(codigo) = codigo {
                segments.push(codigo.as_str());
            }
        }
        Ok(url)
    }

    /// Turn a non-2xx response into [`TransportError::Status`].
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl LoteApi for LoteClient {
    async fn list(&self) -> Result<Vec<Lote>, TransportError> {
        let resp = self.http.get(self.url(None)?).send().await?;
        let resp = Self::check(resp).await?;
        // Body read failures stay `Network`; only bad JSON is `Decode`.
        let body = resp.text().await?;
        let lotes: Vec<Lote> = serde_json::from_str(&body)
            .map_err(|e| TransportError::Decode(format!("lote list: {}", e)))?;
        tracing::debug!(count = lotes.len(), "fetched lotes");
        Ok(lotes)
    }

    async fn create(&self, lote: &NewLote) -> Result<Option<Lote>, TransportError> {
        let resp = self.http.post(self.url(None)?).json(lote).send().await?;
        let resp = Self::check(resp).await?;

        // The server may answer with the stored batch, an id, or nothing.
        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Lote>(&body) {
            Ok(created) => Ok(Some(created)),
            Err(e) => {
                tracing::debug!("create response is not a lote: {}", e);
                Ok(None)
            }
        }
    }

    async fn delete(&self, codigo: &Codigo) -> Result<(), TransportError> {
        let resp = self.http.delete(self.url(Some(codigo))?).send().await?;
        Self::check(resp).await?;
        Ok(())
    }
}
