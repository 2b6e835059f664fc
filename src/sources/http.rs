//! HTTP fetcher - release assets over plain blocking HTTP.

use std::error::Error as StdError;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use url::Url;

use crate::sources::{FetchError, Fetcher};
use crate::util::config::NetConfig;

/// Fetches resources with a blocking reqwest client.
///
/// Downloads land in a temp file beside the destination and are moved into
/// place only once the body has been read completely.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    offline: bool,
}

impl HttpFetcher {
    /// Create a fetcher from network settings.
    pub fn new(net: &NetConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(net.user_agent.clone())
            .build()
            .context("failed to build HTTP client")?;

        Ok(HttpFetcher {
            client,
            offline: net.offline,
        })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url, dest: &Path) -> Result<(), FetchError> {
        if self.offline {
            return Err(FetchError::Offline {
                url: url.to_string(),
            });
        }

        tracing::debug!("Fetching {} to {}", url, dest.display());

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| transport(url, &e))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let io_error = |source: std::io::Error| FetchError::Io {
            path: dest.display().to_string(),
            source,
        };

        let parent = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(io_error)?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(io_error)?;
        let written = response
            .copy_to(tmp.as_file_mut())
            .map_err(|e| transport(url, &e))?;
        tmp.persist(dest).map_err(|e| io_error(e.error))?;

        tracing::debug!("Fetched {} ({} bytes)", url, written);
        Ok(())
    }
}

/// Flatten a reqwest error and its causes into a transport error.
fn transport(url: &Url, err: &reqwest::Error) -> FetchError {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }

    FetchError::Transport {
        url: url.to_string(),
        message,
    }
}
