use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use warden_dns_application::{ListSource, ListSourceLoader};
use warden_dns_domain::ResolveError;

/// Loads list sources over HTTP(S) or from the filesystem.
///
/// Holds one persistent HTTP client so reloads reuse the connection pool.
pub struct FetchingSourceLoader {
    http: reqwest::Client,
}

impl FetchingSourceLoader {
    pub fn new() -> Result<Self, ResolveError> {
        let http = reqwest::Client::builder()
            .user_agent("warden-dns/0.4 (list-sync)")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ResolveError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    async fn fetch_url(&self, url: &str) -> Result<String, ResolveError> {
        let source_err = |message: String| ResolveError::SourceLoad {
            list_source: url.to_string(),
            message,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| source_err(format!("fetch error: {}", e)))?;

        if !response.status().is_success() {
            return Err(source_err(format!("HTTP {}", response.status().as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| source_err(format!("read error: {}", e)))
    }
}

#[async_trait]
impl ListSourceLoader for FetchingSourceLoader {
    async fn load(&self, source: &ListSource) -> Result<Vec<String>, ResolveError> {
        let text = match source {
            ListSource::Url(url) => self.fetch_url(url).await?,
            ListSource::File(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                ResolveError::SourceLoad {
                    list_source: path.clone(),
                    message: e.to_string(),
                }
            })?,
            ListSource::Inline(lines) => return Ok(lines.clone()),
        };

        let lines: Vec<String> = text.lines().map(str::to_owned).collect();
        debug!(source = %source, lines = lines.len(), "List source loaded");
        Ok(lines)
    }
}
