//! Process configuration: CLI flags with environment fallbacks.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::Error;
use crate::server::DEFAULT_MAX_BODY_BYTES;
use crate::store::PostgrestStore;

/// Micro-blogging API server.
#[derive(Parser, Debug, Clone)]
#[command(name = "tweetstack", version)]
#[command(about = "HTTP API for tweets, comments and social interactions", long_about = None)]
pub struct Config {
    /// Full bind address; overrides --port.
    #[arg(long, env = "BIND_ADDR")]
    pub bind: Option<SocketAddr>,

    /// Port to listen on (all interfaces).
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Data API base URL.
    #[arg(long, env = "SUPABASE_URL", default_value = "")]
    pub supabase_url: String,

    /// Data API access key.
    #[arg(long, env = "SUPABASE_KEY", default_value = "", hide_env_values = true)]
    pub supabase_key: String,

    /// Upper bound on every store call, in seconds.
    #[arg(long, env = "STORE_TIMEOUT_SECS", default_value_t = 5)]
    pub store_timeout_secs: u64,

    /// Largest request body accepted, in bytes. Larger bodies get a 413.
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Optional .env file loaded before the environment is read.
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    pub dotenv: PathBuf,
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind.unwrap_or_else(|| SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port)))
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.supabase_url.trim().is_empty() || self.supabase_key.trim().is_empty() {
            return Err(Error::Config("SUPABASE_URL or SUPABASE_KEY not set".into()));
        }
        if self.store_timeout_secs == 0 {
            return Err(Error::Config("STORE_TIMEOUT_SECS must be positive".into()));
        }
        if self.max_body_bytes == 0 {
            return Err(Error::Config("MAX_BODY_BYTES must be positive".into()));
        }
        Ok(())
    }

    /// Validates and builds the store gateway. Called once per process.
    pub fn store(&self) -> Result<PostgrestStore, Error> {
        self.validate()?;
        PostgrestStore::new(&self.supabase_url, &self.supabase_key, self.store_timeout())
    }
}
