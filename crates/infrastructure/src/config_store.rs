use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;
use warden_dns_domain::Config;

/// Hot-reloadable config snapshot.
///
/// Readers capture one `Arc<Config>` per query and never observe a torn
/// view; a reload publishes a whole replacement snapshot.
pub struct SharedConfig {
    inner: ArcSwap<Config>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: ArcSwap::from_pointee(config),
        }
    }

    pub fn load(&self) -> Arc<Config> {
        self.inner.load_full()
    }

    pub fn store(&self, config: Config) {
        self.inner.store(Arc::new(config));
        info!("Configuration snapshot replaced");
    }
}
