use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod direct;
pub mod youtube;

use direct::DirectFetcher;
use youtube::YtDlpFetcher;

/// Errors raised while fetching one remote item
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("fetch process failed: {0}")]
    ProcessFailed(String),

    #[error("fetch produced no output file at {0}")]
    MissingOutput(PathBuf),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Trait for fetching remote media to a local file
///
/// The remote identifier is opaque to callers; how an implementation turns it
/// into bytes on disk (format negotiation, site extraction) is its own
/// business. The returned path is namespaced by the identifier so concurrent
/// workers never collide.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the item into `dest_dir` and return the local media path
    async fn fetch(&self, remote_id: &str, dest_dir: &Path) -> Result<PathBuf, FetchError>;
}

/// Default fetcher: routes each catalog id to the right implementation
///
/// Ids shaped like `http(s)://` URLs are downloaded directly; everything else
/// is treated as a YouTube video id.
pub struct CatalogFetcher {
    youtube: YtDlpFetcher,
    direct: DirectFetcher,
}

impl CatalogFetcher {
    pub fn new() -> Self {
        Self {
            youtube: YtDlpFetcher::new(),
            direct: DirectFetcher::new(),
        }
    }

    fn is_direct_url(remote_id: &str) -> bool {
        if !remote_id.starts_with("http://") && !remote_id.starts_with("https://") {
            return false;
        }
        url::Url::parse(remote_id).is_ok()
    }
}

#[async_trait]
impl Fetcher for CatalogFetcher {
    async fn fetch(&self, remote_id: &str, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        if Self::is_direct_url(remote_id) {
            self.direct.fetch(remote_id, dest_dir).await
        } else {
            self.youtube.fetch(remote_id, dest_dir).await
        }
    }
}

impl Default for CatalogFetcher {
    fn default() -> Self {
        Self::new()
    }
}
