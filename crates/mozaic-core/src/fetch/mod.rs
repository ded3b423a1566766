//! Source text retrieval.
//!
//! Exactly one of three strategies is used for the lifetime of a
//! [`Fetcher`]; which one is decided once from [`HostCapabilities`]:
//!
//! | probe (in order)                          | strategy     |
//! |-------------------------------------------|--------------|
//! | process runtime version marker            | `Filesystem` |
//! | browser globals or worker globals         | `Network`    |
//! | managed-platform package namespace        | `Embedded`   |
//! | none of the above                         | `Unsupported`|
//!
//! An `Unsupported` fetcher fails every call immediately, before any I/O.

pub mod embedded;
pub mod filesystem;
pub mod network;

pub use embedded::EmbeddedFetcher;
pub use filesystem::FilesystemFetcher;
pub use network::NetworkFetcher;

use crate::config::HostKind;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Error while fetching module source text.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Environment unsupported.")]
    Unsupported,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request for {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Stable error code for JSON output.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unsupported => "FETCH_ENVIRONMENT_UNSUPPORTED",
            Self::Io { .. } => "FETCH_IO_ERROR",
            Self::Http { .. } => "FETCH_HTTP_ERROR",
            Self::Status { .. } => "FETCH_HTTP_STATUS",
            Self::Client(_) => "FETCH_CLIENT_ERROR",
        }
    }
}

/// Markers describing what the host environment exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HostCapabilities {
    /// Version marker of a process-like runtime with local file access.
    pub runtime_version: Option<String>,
    /// A window with `navigator` and `document`.
    pub browser_globals: bool,
    /// A web-worker style `importScripts`.
    pub worker_globals: bool,
    /// A general managed-platform package namespace with a file API.
    pub platform_namespace: bool,
    /// A usable base64 encoder for inline source maps.
    pub base64: bool,
}

impl HostCapabilities {
    /// A host with nothing recognizable.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Probe the running process.
    ///
    /// A native process is a runtime with local file access and always has a
    /// base64 encoder.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            runtime_version: Some(crate::VERSION.to_string()),
            base64: true,
            ..Self::default()
        }
    }

    /// Capabilities for a configured host kind.
    ///
    /// The embedded host has no base64 encoder, so its artifacts carry no
    /// inline source map.
    #[must_use]
    pub fn for_host(kind: HostKind) -> Self {
        match kind {
            HostKind::Auto => Self::detect(),
            HostKind::Filesystem => Self {
                runtime_version: Some(crate::VERSION.to_string()),
                base64: true,
                ..Self::default()
            },
            HostKind::Network => Self {
                browser_globals: true,
                base64: true,
                ..Self::default()
            },
            HostKind::Embedded => Self {
                platform_namespace: true,
                ..Self::default()
            },
        }
    }

    /// Strategy these capabilities select, without building it.
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        if self.runtime_version.is_some() {
            "filesystem"
        } else if self.browser_globals || self.worker_globals {
            "network"
        } else if self.platform_namespace {
            "embedded"
        } else {
            "unsupported"
        }
    }
}

/// The fetch strategy chosen for this host.
#[derive(Debug, Clone)]
pub enum Fetcher {
    Filesystem(FilesystemFetcher),
    Network(NetworkFetcher),
    Embedded(EmbeddedFetcher),
    Unsupported,
}

impl Fetcher {
    /// Select a strategy from `caps`.
    ///
    /// A host without any recognized capability gets [`Fetcher::Unsupported`];
    /// the error surfaces on the first fetch.
    pub fn select(caps: &HostCapabilities) -> Result<Self, FetchError> {
        let fetcher = match caps.strategy() {
            "filesystem" => Self::Filesystem(FilesystemFetcher::new()),
            "network" => Self::Network(NetworkFetcher::new()?),
            "embedded" => Self::Embedded(EmbeddedFetcher::new()),
            _ => Self::Unsupported,
        };
        tracing::debug!(strategy = fetcher.kind(), "selected fetch strategy");
        Ok(fetcher)
    }

    /// Resolve relative paths against `root` (filesystem and embedded strategies).
    #[must_use]
    pub fn with_root(self, root: impl Into<PathBuf>) -> Self {
        match self {
            Self::Filesystem(f) => Self::Filesystem(f.with_root(root)),
            Self::Embedded(f) => Self::Embedded(f.with_root(root)),
            other => other,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Filesystem(_) => "filesystem",
            Self::Network(_) => "network",
            Self::Embedded(_) => "embedded",
            Self::Unsupported => "unsupported",
        }
    }

    /// Fetch the text at `path`. Completes exactly once, with the text or an error.
    pub async fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        match self {
            Self::Filesystem(f) => f.fetch_text(path),
            Self::Network(f) => f.fetch_text(path).await,
            Self::Embedded(f) => f.fetch_text(path),
            Self::Unsupported => Err(FetchError::Unsupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_order() {
        let all = HostCapabilities {
            runtime_version: Some("1.0".into()),
            browser_globals: true,
            worker_globals: true,
            platform_namespace: true,
            base64: true,
        };
        assert_eq!(all.strategy(), "filesystem");

        let browser_and_platform = HostCapabilities {
            browser_globals: true,
            platform_namespace: true,
            ..HostCapabilities::none()
        };
        assert_eq!(browser_and_platform.strategy(), "network");

        let worker = HostCapabilities {
            worker_globals: true,
            ..HostCapabilities::none()
        };
        assert_eq!(worker.strategy(), "network");

        let platform = HostCapabilities {
            platform_namespace: true,
            ..HostCapabilities::none()
        };
        assert_eq!(platform.strategy(), "embedded");

        assert_eq!(HostCapabilities::none().strategy(), "unsupported");
    }

    #[test]
    fn test_detect_selects_filesystem() {
        let caps = HostCapabilities::detect();
        assert!(caps.base64);
        assert_eq!(Fetcher::select(&caps).unwrap().kind(), "filesystem");
    }

    #[test]
    fn test_for_host() {
        assert_eq!(
            HostCapabilities::for_host(HostKind::Network).strategy(),
            "network"
        );
        let embedded = HostCapabilities::for_host(HostKind::Embedded);
        assert_eq!(embedded.strategy(), "embedded");
        assert!(!embedded.base64);
    }

    #[tokio::test]
    async fn test_unsupported_fails_without_io() {
        let fetcher = Fetcher::select(&HostCapabilities::none()).unwrap();
        assert_eq!(fetcher.kind(), "unsupported");

        // The path does not exist; an Io error would mean a read was attempted
        let err = fetcher
            .fetch_text("/definitely/not/here.coffee")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Unsupported));
        assert_eq!(err.to_string(), "Environment unsupported.");
    }
}
