//! Remote icon service access
//!
//! `IconSource` is the seam between the retry state machine and the network:
//! the HTTP implementation performs exactly one request per call and never
//! retries on its own.

use crate::entries::EntryId;
use crate::error::{VaultIconError, VaultIconResult};
use std::fmt;
use std::io;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One response from the icon service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub retry_after: Option<String>,
    /// Only read for 200 responses
    pub body: Vec<u8>,
}

impl IconResponse {
    /// Whether the content type announces an image
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("image"))
    }
}

/// Failure below the HTTP status level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Retryable: the request exceeded its timeout
    Timeout(String),
    /// Terminal: DNS, connection refused, TLS and the like
    Failed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout(reason) => write!(f, "timeout: {}", reason),
            Self::Failed(reason) => f.write_str(reason),
        }
    }
}

/// Blocking access to icons by entry id
pub trait IconSource: Send + Sync {
    /// Perform a single request for the icon of `id`
    fn get(&self, id: &EntryId) -> Result<IconResponse, TransportError>;
}

/// Icon service over HTTP: `GET <base_url>/<id>/icon.png`
///
/// The id becomes one percent-encoded path segment.
pub struct HttpIconSource {
    agent: ureq::Agent,
    base_url: Url,
}

impl HttpIconSource {
    pub fn new(base_url: &str, timeout: Duration) -> VaultIconResult<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(VaultIconError::InvalidBaseUrl(base_url.to_string()));
        }

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Ok(Self {
            agent: config.into(),
            base_url,
        })
    }

    /// Address of the icon for `id`
    pub fn icon_url(&self, id: &EntryId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id.as_str()).push("icon.png");
        }
        url
    }
}

impl IconSource for HttpIconSource {
    fn get(&self, id: &EntryId) -> Result<IconResponse, TransportError> {
        let url = self.icon_url(id);
        debug!("GET {}", url);

        let mut response = self.agent.get(url.as_str()).call().map_err(classify)?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let status = response.status().as_u16();
        let content_type = header("content-type");
        let retry_after = header("retry-after");

        let body = if status == 200 {
            response.body_mut().read_to_vec().map_err(classify)?
        } else {
            Vec::new()
        };

        Ok(IconResponse {
            status,
            content_type,
            retry_after,
            body,
        })
    }
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(kind) => TransportError::Timeout(format!("{:?}", kind)),
        ureq::Error::Io(e) if e.kind() == io::ErrorKind::TimedOut => {
            TransportError::Timeout(e.to_string())
        }
        other => TransportError::Failed(other.to_string()),
    }
}
