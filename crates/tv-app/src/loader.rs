//! Catalog fetching. Transport and decode live here; validation and mapping
//! are in `tv_proto::catalog`.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};
use tv_proto::catalog::parse_listing;
use tv_proto::error::LoadFailure;
use tv_proto::protocol::Catalog;
use url::Url;

/// Where a listing document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    Http(String),
    File(PathBuf),
}

impl CatalogSource {
    /// `http(s)://` and `file://` URLs are recognised; anything else is a
    /// filesystem path, relative to the working directory.
    pub fn parse(uri: &str) -> Result<Self, LoadFailure> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(LoadFailure::Transport("empty catalog source".to_string()));
        }
        match Url::parse(uri) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Self::Http(url.into())),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|_| LoadFailure::Transport(format!("bad file URL: {}", uri))),
            // Windows drive letters parse as a one-letter scheme.
            Ok(url) if url.scheme().len() > 1 => Err(LoadFailure::Transport(format!(
                "unsupported catalog scheme {:?}",
                url.scheme()
            ))),
            _ => Ok(Self::File(PathBuf::from(uri))),
        }
    }
}

#[derive(Clone)]
pub struct CatalogLoader {
    client: Client,
}

impl CatalogLoader {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }

    pub async fn load(&self, uri: &str, generation: u64) -> Result<Catalog, LoadFailure> {
        let source = CatalogSource::parse(uri)?;
        debug!("loader: gen={} fetching {:?}", generation, source);
        let body = match &source {
            CatalogSource::Http(url) => self.fetch_http(url).await?,
            CatalogSource::File(path) => tokio::fs::read(path)
                .await
                .map_err(|e| LoadFailure::Transport(format!("{}: {}", path.display(), e)))?,
        };
        let catalog = parse_listing(&body, generation)?;
        info!(
            "loader: gen={} loaded {} items from {}",
            generation,
            catalog.len(),
            uri
        );
        Ok(catalog)
    }

    async fn fetch_http(&self, url: &str) -> Result<Vec<u8>, LoadFailure> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LoadFailure::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadFailure::HttpStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| LoadFailure::Transport(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
