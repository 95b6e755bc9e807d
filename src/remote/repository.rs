use crate::archive::ArchiveFormat;
use crate::error::{ProcessingError, Result};
use crate::utils::constants::{MAX_DOWNLOAD_RETRIES, README_MARKER, RETRY_DELAY_SECS};
use reqwest::{Client, Response};
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

/// An archive advertised by the remote directory index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArchive {
    pub name: String,
    pub url: Url,
}

/// Session with the remote file repository. Created once per run and passed
/// to every listing and download; the underlying connection pool is released
/// when it is dropped.
pub struct RemoteRepository {
    client: Client,
    base_url: Url,
}

impl RemoteRepository {
    pub fn connect(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;

        // Url::join drops the last segment unless the base ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(%base_url, "connected to remote repository");

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List every archive in the directory index, optionally restricted to
    /// names containing `file_pattern`.
    pub async fn list_archives(&self, file_pattern: Option<&str>) -> Result<Vec<RemoteArchive>> {
        let html = self.fetch(&self.base_url, |resp| resp.text()).await?;
        let mut archives = parse_archive_links(&html, &self.base_url)?;

        if let Some(pattern) = file_pattern.filter(|p| !p.is_empty()) {
            archives.retain(|archive| archive.name.contains(pattern));
        }

        info!(count = archives.len(), "listed remote archives");
        Ok(archives)
    }

    /// Download `archive` into `dest_dir`, returning the saved path.
    pub async fn download(&self, archive: &RemoteArchive, dest_dir: &Path) -> Result<PathBuf> {
        let dest_path = dest_dir.join(&archive.name);
        fs::create_dir_all(dest_dir).await?;

        let bytes = self.fetch(&archive.url, |resp| resp.bytes()).await?;
        fs::write(&dest_path, &bytes).await?;

        debug!(
            archive = %archive.name,
            bytes = bytes.len(),
            dest = %dest_path.display(),
            "downloaded archive"
        );

        Ok(dest_path)
    }

    async fn fetch<T, F, Fut>(&self, url: &Url, read_body: F) -> Result<T>
    where
        F: Fn(Response) -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match self.client.get(url.clone()).send().await {
                Ok(resp) => match resp.error_for_status() {
                    Ok(resp) => read_body(resp).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };

            match result {
                Ok(body) => return Ok(body),
                Err(e) if attempt < MAX_DOWNLOAD_RETRIES => {
                    warn!(%url, attempt, error = %e, "request failed, retrying");
                    sleep(Duration::from_secs(RETRY_DELAY_SECS)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Extract archive links from an HTML directory listing. Links are resolved
/// against `base`, de-duplicated and sorted by name; `readme` files and
/// non-archive links are dropped.
pub fn parse_archive_links(html: &str, base: &Url) -> Result<Vec<RemoteArchive>> {
    let selector = Selector::parse("a[href]")
        .map_err(|e| ProcessingError::InvalidFormat(format!("Invalid CSS selector: {:?}", e)))?;

    let mut archives = BTreeMap::new();

    for href in Html::parse_document(html)
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
    {
        let Ok(url) = base.join(href) else {
            continue;
        };

        let Some(name) = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
        else {
            continue;
        };

        if name.to_lowercase().contains(README_MARKER) {
            continue;
        }
        if ArchiveFormat::from_file_name(&name).is_none() {
            continue;
        }

        archives.entry(name.clone()).or_insert(RemoteArchive { name, url });
    }

    Ok(archives.into_values().collect())
}
