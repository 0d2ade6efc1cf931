use async_trait::async_trait;
use std::fmt;
use warden_dns_domain::ResolveError;

/// Where a block/allow list comes from.
#[derive(Debug, Clone)]
pub enum ListSource {
    Url(String),
    File(String),
    /// Inline patterns carried directly in the config.
    Inline(Vec<String>),
}

impl fmt::Display for ListSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListSource::Url(url) => f.write_str(url),
            ListSource::File(path) => f.write_str(path),
            ListSource::Inline(_) => f.write_str("<inline>"),
        }
    }
}

/// List source loading port; used only by the blocklist update path, never
/// per query.
#[async_trait]
pub trait ListSourceLoader: Send + Sync {
    async fn load(&self, source: &ListSource) -> Result<Vec<String>, ResolveError>;
}
