//! Retrieval of the raw relay listing.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use derive_more::{Display, Error};
use exn::ResultExt;
use reqwest::blocking::Client;
use tracing::{debug, info, instrument};
use vpngate_extract::{LOG_PREVIEW_CHARS, truncate_for_log};

/// A retrieval error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed.
    #[display("could not build HTTP client")]
    Client,
    #[display("request to {_0} timed out")]
    Timeout(#[error(not(source))] String),
    #[display("request to {_0} failed")]
    Network(#[error(not(source))] String),
    /// The source answered with a non-success status.
    #[display("source responded with status {code}: {preview}")]
    Status { code: u16, preview: String },
    /// A saved listing could not be read.
    #[display("could not read listing from {_0}")]
    Read(#[error(not(source))] String),
}

impl ErrorKind {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Status { code, .. } => *code >= 500 || *code == 429,
            Self::Client | Self::Read(_) => false,
        }
    }
}

/// Anything that can hand over one listing as text.
pub trait Retrieve {
    /// Human-readable origin of the listing, for logs.
    fn source(&self) -> &str;

    fn retrieve(&self) -> Result<String>;
}

/// Fetches the listing with a single blocking `GET`.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
    url: String,
}
impl HttpRetriever {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build().or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, url: url.into() })
    }
}
impl Retrieve for HttpRetriever {
    fn source(&self) -> &str {
        &self.url
    }

    #[instrument(skip_all, fields(bytes))]
    fn retrieve(&self) -> Result<String> {
        debug!(url = %truncate_for_log(&self.url, LOG_PREVIEW_CHARS), "requesting relay listing");
        let classify = |err: &reqwest::Error| {
            let url = truncate_for_log(&self.url, LOG_PREVIEW_CHARS);
            if err.is_timeout() { ErrorKind::Timeout(url) } else { ErrorKind::Network(url) }
        };
        let response = match self.client.get(&self.url).send() {
            Ok(response) => response,
            Err(err) => {
                let kind = classify(&err);
                return Err(err).or_raise(|| kind.clone());
            },
        };
        let status = response.status();
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => {
                let kind = classify(&err);
                return Err(err).or_raise(|| kind.clone());
            },
        };
        if !status.is_success() {
            exn::bail!(ErrorKind::Status {
                code: status.as_u16(),
                preview: truncate_for_log(&body, LOG_PREVIEW_CHARS),
            });
        }
        tracing::Span::current().record("bytes", body.len());
        info!(
            status = status.as_u16(),
            bytes = body.len(),
            preview = %truncate_for_log(&body, LOG_PREVIEW_CHARS),
            "retrieved relay listing"
        );
        Ok(body)
    }
}

/// Where a saved listing is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalInput {
    File(PathBuf),
    Stdin,
}
impl LocalInput {
    /// `-` means standard input.
    pub fn from_arg(arg: impl Into<PathBuf>) -> Self {
        let path = arg.into();
        if path.as_os_str() == "-" { Self::Stdin } else { Self::File(path) }
    }
}

/// Reads a listing that was saved earlier instead of fetching it.
#[derive(Debug, Clone)]
pub struct LocalRetriever {
    input: LocalInput,
    label: String,
}
impl LocalRetriever {
    pub fn new(input: LocalInput) -> Self {
        let label = match &input {
            LocalInput::File(path) => path.display().to_string(),
            LocalInput::Stdin => "stdin".to_string(),
        };
        Self { input, label }
    }
}
impl Retrieve for LocalRetriever {
    fn source(&self) -> &str {
        &self.label
    }

    fn retrieve(&self) -> Result<String> {
        let text = match &self.input {
            LocalInput::File(path) => fs::read_to_string(path).or_raise(|| ErrorKind::Read(self.label.clone()))?,
            LocalInput::Stdin => {
                let mut text = String::new();
                std::io::stdin().read_to_string(&mut text).or_raise(|| ErrorKind::Read(self.label.clone()))?;
                text
            },
        };
        info!(source = %self.label, bytes = text.len(), "read saved relay listing");
        Ok(text)
    }
}
