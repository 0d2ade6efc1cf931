use warden_dns_domain::Config;

pub fn init_logging(config: &Config) {
    let log_level = config.logging.level.parse().unwrap_or(tracing::Level::INFO);

    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_target(true)
            .with_thread_ids(false)
            .with_level(true)
            .with_max_level(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_target(true)
            .with_thread_ids(false)
            .with_level(true)
            .with_max_level(log_level)
            .with_ansi(true)
            .init();
    }
}
