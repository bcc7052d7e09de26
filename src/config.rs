//! Runtime configuration. CLI flags override environment variables, which
//! override the defaults below.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Parser)]
#[command(name = "sitedesk", about = "sitedesk admin dashboard server")]
pub struct Config {
    /// Address to bind the HTTP listener on
    #[arg(long, env = "SITEDESK_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind: IpAddr,

    /// HTTP port
    #[arg(long, env = "SITEDESK_HTTP_PORT", default_value_t = 7878)]
    pub http_port: u16,

    /// PostgreSQL connection string; without it everything lives in memory
    #[arg(long, env = "SITEDESK_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Session lifetime in seconds (at least 1)
    #[arg(long, env = "SITEDESK_SESSION_TTL_SECS", default_value_t = 7 * 24 * 60 * 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub session_ttl_secs: u64,

    /// Seconds between expired-session purges; 0 disables the sweeper
    #[arg(long, env = "SITEDESK_SESSION_SWEEP_SECS", default_value_t = 300)]
    pub session_sweep_secs: u64,

    /// Mark the session cookie `Secure`
    #[arg(long, env = "SITEDESK_SECURE_COOKIES", default_value_t = false)]
    pub secure_cookies: bool,

    /// Email of the SUPER_ADMIN account to create at startup if missing
    #[arg(long, env = "SITEDESK_BOOTSTRAP_ADMIN_EMAIL", requires = "bootstrap_admin_password")]
    pub bootstrap_admin_email: Option<String>,

    #[arg(long, env = "SITEDESK_BOOTSTRAP_ADMIN_PASSWORD", hide_env_values = true)]
    pub bootstrap_admin_password: Option<String>,
}

impl Config {
    pub fn http_addr(&self) -> SocketAddr { SocketAddr::new(self.bind, self.http_port) }

    /// Capped at ten years.
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.session_ttl_secs.min(MAX_SESSION_TTL_SECS) as i64)
    }

    pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
        match (&self.bootstrap_admin_email, &self.bootstrap_admin_password) {
            (Some(e), Some(p)) if !e.trim().is_empty() && !p.is_empty() => Some((e.as_str(), p.as_str())),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            http_port: 7878,
            database_url: None,
            session_ttl_secs: 7 * 24 * 60 * 60,
            session_sweep_secs: 300,
            secure_cookies: false,
            bootstrap_admin_email: None,
            bootstrap_admin_password: None,
        }
    }
}
