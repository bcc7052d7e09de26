use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sitedesk::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = Config::parse();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "startup",
        "sitedesk starting: RUST_LOG='{}', http={}, store={}, session_ttl_secs={}, sweep_secs={}, secure_cookies={}",
        rust_log,
        config.http_addr(),
        if config.database_url.is_some() { "postgres" } else { "memory" },
        config.session_ttl_secs,
        config.session_sweep_secs,
        config.secure_cookies
    );

    sitedesk::server::run(config).await
}
