use futures_util::StreamExt;
use reqwest::Client;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

use super::FetchError;

/// Fetcher for items whose catalog id is already a direct media URL
pub struct DirectFetcher {
    client: Client,
}

impl DirectFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Local filename for a URL id: a stable hash plus the URL's extension
    ///
    /// URLs are too long (and too character-rich) to be filenames themselves,
    /// and the path must stay deterministic per id across retries.
    fn local_name(url: &str) -> String {
        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);

        let ext = Url::parse(url)
            .ok()
            .and_then(|u| {
                Path::new(u.path())
                    .extension()
                    .map(|e| e.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "mp4".to_string());

        format!("direct_{:016x}.{}", hasher.finish(), ext)
    }

    pub async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, FetchError> {
        let dest = dest_dir.join(Self::local_name(url));

        tracing::debug!(url, dest = %dest.display(), "downloading direct URL");

        let response = self.client.get(url).send().await?.error_for_status()?;

        let mut file = fs_err::File::create(&dest)?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)?;
        }

        Ok(dest)
    }
}

impl Default for DirectFetcher {
    fn default() -> Self {
        Self::new()
    }
}
