//! Caller identity.
//!
//! The caller claims an identity in the `Authorization` header. The default
//! [`HeaderAuthenticator`] takes that claim at face value: the header value
//! *is* the user id, and a route acting on behalf of user `N` is authorized
//! when the header reads exactly `N`. That is a request-shape check, not a
//! security boundary. Handlers only see the [`Authenticator`] trait, so a
//! real scheme can replace it without touching them.

use std::fmt;

/// Header carrying the caller's claimed identity.
pub const AUTH_HEADER: &str = "authorization";

/// Who the caller claims to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(String);

impl Identity {
    pub fn new(credential: impl Into<String>) -> Self {
        Self(credential.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity as a numeric user id, if it is one.
    pub fn user_id(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of checking a caller against a path's subject id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Authorized(Identity),
    Unauthorized,
}

/// Turns a request credential into an [`Identity`].
pub trait Authenticator: Send + Sync {
    /// The identity behind `credential`, or `None` when there is none.
    fn identify(&self, credential: Option<&str>) -> Option<Identity>;

    /// Whether the caller may act as `subject`. Fails closed.
    fn authorize(&self, credential: Option<&str>, subject: &str) -> Verdict {
        match self.identify(credential) {
            Some(identity) if identity.as_str() == subject => Verdict::Authorized(identity),
            _ => Verdict::Unauthorized,
        }
    }
}

/// The header value is the identity; authorization is raw string equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderAuthenticator;

impl Authenticator for HeaderAuthenticator {
    fn identify(&self, credential: Option<&str>) -> Option<Identity> {
        credential.filter(|c| !c.is_empty()).map(Identity::new)
    }
}
