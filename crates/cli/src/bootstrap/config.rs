use warden_dns_domain::Config;

/// Command-line overrides applied on top of the config file.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub bind_address: Option<String>,
    pub dns_port: Option<u16>,
    pub log_level: Option<String>,
}

pub fn load_config(config_path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let mut config = match config_path {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };

    if let Some(bind) = overrides.bind_address {
        config.server.bind_address = bind;
    }
    if let Some(port) = overrides.dns_port {
        config.server.dns_port = port;
    }
    if let Some(level) = overrides.log_level {
        config.logging.level = level;
    }

    Ok(config)
}
