//! Minimal GitHub adapter for checkrelay.
//!
//! Deliberately not a general API client: the only surface here is what one
//! check-run submission needs. All outbound calls go through the
//! [`Transport`] seam so the layers above stay testable without a network.

mod auth;
mod checks;
mod transport;

pub use auth::{AuthConfig, AuthError, AuthProvider, Credential};
pub use checks::{CheckClient, GithubChecks, ReportError};
pub use transport::{HttpTransport, Transport, TransportError, DEFAULT_API_BASE};
