pub mod config;
pub mod logging;

pub use config::{load_config, CliOverrides};
pub use logging::init_logging;
