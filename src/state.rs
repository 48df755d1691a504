//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::{Authenticator, HeaderAuthenticator};
use crate::repo::Repositories;
use crate::store::Store;

/// Everything a handler may touch. Cloned per request; all fields are
/// reference-counted, and nothing in here is mutable.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub auth: Arc<dyn Authenticator>,
}

impl AppState {
    /// State over `store`, authenticating with [`HeaderAuthenticator`].
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            repos: Repositories::new(store),
            auth: Arc::new(HeaderAuthenticator),
        }
    }

    pub fn with_authenticator(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = auth;
        self
    }
}
