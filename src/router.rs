//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. A method + path shape
//! either selects exactly one handler or the request is answered with a
//! bodiless `404`: wrong method, unknown prefix and wrong arity are all the
//! same outcome.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::Method;
use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;

use crate::error::ApiError;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// The application router.
///
/// Build it once at startup, hand it the shared state, and pass it to
/// [`Server::serve`](crate::Server::serve). Every registration returns `self`
/// so calls chain.
pub struct Router<S = ()> {
    routes: HashMap<Method, MatchitRouter<BoxedHandler<S>>>,
    state: S,
}

impl Router<()> {
    pub fn new() -> Self {
        Self::with_state(())
    }
}

impl Default for Router<()> {
    fn default() -> Self { Self::new() }
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// A router whose handlers each receive a clone of `state`.
    pub fn with_state(state: S) -> Self {
        Self { routes: HashMap::new(), state }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax and are read back with
    /// [`Request::param`].
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid or conflicts with one already
    /// registered for the same method. Routes are fixed at startup, so this
    /// is a programming error rather than a runtime condition.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler<S>, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Routes one buffered request and produces its response.
    ///
    /// This is the whole request path minus the socket: the server calls it
    /// for every request, and tests call it directly.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let (parts, body) = req.into_parts();
        let path = normalize_path(parts.uri.path());

        match self.lookup(&parts.method, &path) {
            Some((handler, params)) => {
                let req = Request::new(parts, body, path).with_params(params);
                handler.call(self.state.clone(), req).await
            }
            None => ApiError::NotFound.into_response(),
        }
    }
}

/// Percent-decodes, trims leading/trailing slashes and collapses empty
/// segments. Routes and path parameters only ever see the decoded form.
///
/// `//tweet///7/` becomes `/tweet/7`, `/follow/%31/2` becomes `/follow/1/2`,
/// and an empty path becomes `/`. Invalid UTF-8 is replaced, not rejected.
pub(crate) fn normalize_path(path: &str) -> String {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut out = String::with_capacity(decoded.len() + 1);
    for segment in decoded.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}
