//! tweetstack server binary.
//!
//! ```text
//! SUPABASE_URL=https://xyz.supabase.co SUPABASE_KEY=... RUST_LOG=info tweetstack
//! ```

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tweetstack::{AppState, Config, Error, Server, router};

#[tokio::main]
async fn main() -> Result<(), Error> {
    let mut config = Config::parse();

    // Values already in the environment win over the file.
    if config.dotenv.exists() {
        dotenvy::from_path(&config.dotenv)
            .map_err(|e| Error::Config(format!("{}: {e}", config.dotenv.display())))?;
        config = Config::parse();
    }

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store = config.store()?;
    tracing::info!(
        store = %config.supabase_url,
        timeout_secs = config.store_timeout_secs,
        "store configured"
    );

    let app = router(AppState::new(Arc::new(store)));

    Server::bind(config.bind_addr())
        .max_body_bytes(config.max_body_bytes)
        .serve(app)
        .await
}
