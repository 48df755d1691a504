//! # tweetstack
//!
//! The HTTP API behind a micro-blogging app: feeds, tweets, comments, and
//! the like / save / restack / follow state between users and content.
//!
//! ## Layers
//!
//! - **HTTP**: [`Router`], [`Request`], [`Response`], [`Server`]. Radix-tree
//!   routing via [`matchit`], hyper underneath, graceful shutdown on SIGTERM.
//! - **Routes**: [`router`] wires every endpoint to its handler.
//! - **Identity**: [`auth::Authenticator`] turns the `Authorization` header
//!   into an [`auth::Identity`].
//! - **Repositories**: [`repo`] speaks in tweets and interactions.
//! - **Store**: [`store::Store`] is the data API; [`store::PostgrestStore`]
//!   talks to it over HTTP, [`store::MemoryStore`] keeps it in process.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tweetstack::store::PostgrestStore;
//! use tweetstack::{AppState, Server, router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tweetstack::Error> {
//!     let store = PostgrestStore::new("https://db.example.com", "key", Duration::from_secs(5))?;
//!     let app = router(AppState::new(Arc::new(store)));
//!
//!     Server::bind("0.0.0.0:8080".parse().unwrap()).serve(app).await
//! }
//! ```

mod config;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod routes;
mod server;
mod state;

pub mod auth;
pub mod health;
pub mod model;
pub mod repo;
pub mod store;

pub use config::Config;
pub use error::{ApiError, Error};
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use routes::router;
pub use server::Server;
pub use state::AppState;
