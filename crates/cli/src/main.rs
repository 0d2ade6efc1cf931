//! # Warden DNS
//!
//! Recursive filtering DNS resolver: per-query blocklist/whitelist/policy
//! decisions, a sharded answer cache, conditional forwarding and circuit
//! breakers around every upstream.

mod bootstrap;
mod di;
mod server;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "warden-dns")]
#[command(version)]
#[command(about = "Recursive filtering DNS resolver")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address override
    #[arg(short, long)]
    bind: Option<String>,

    /// DNS port override
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let overrides = bootstrap::CliOverrides {
        bind_address: cli.bind,
        dns_port: cli.port,
        log_level: cli.log_level,
    };
    let config = bootstrap::load_config(cli.config.as_deref(), overrides)?;
    bootstrap::init_logging(&config);

    info!(
        config_file = cli.config.as_deref().unwrap_or("default"),
        dns_port = config.server.dns_port,
        bind = %config.server.bind_address,
        upstreams = config.dns.upstreams.len(),
        "Warden DNS starting"
    );

    let shutdown = CancellationToken::new();
    let services = di::DnsServices::build(config).await?;
    services.start_jobs(shutdown.child_token());

    let handler = services.server_handler(shutdown.child_token());
    let bind_addr = services.bind_address();
    let tcp_timeout = services.tcp_timeout();

    let server_shutdown = shutdown.clone();
    let server_task = tokio::spawn(async move {
        if let Err(e) = server::dns::start_dns_server(bind_addr, handler, tcp_timeout).await {
            tracing::error!(error = %e, "DNS server terminated");
            server_shutdown.cancel();
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
    server_task.abort();
    info!("Warden DNS stopped");
    Ok(())
}
