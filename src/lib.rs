//! A client for the admin console's REST API.
//!
//! [`SessionService`] owns the login session (token storage, MFA, logout
//! and the inactivity timeout) while the [`endpoints`] module wraps the
//! individual admin operations.

#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod config;
mod context;
pub mod endpoints;
pub mod filter;
mod http;
mod id;
pub mod models;
mod service;
mod session;
pub mod storage;
mod timer;
pub mod transport;
pub mod validate;

pub use config::{Config, Paths};
pub use context::AuthContext;
pub use endpoints::{EndpointError, LoginError, MfaChallenge};
pub use http::{Auth, HttpClient};
pub use id::Id;
pub use service::{
    AuthState, LoginOutcome, LogoutReason, SessionError, SessionService,
};
pub use session::{Session, SessionStore, TOKEN_KEY, USER_KEY};
pub use timer::{Activity, InactivityTimer};

/// The default user agent to use when communicating with the backend.
pub const DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));
