//! Toggl REST plumbing: credentials, base URLs and the request helper.

pub mod api;
pub mod auth;
pub mod client;
pub mod error;

pub use api::{ApiBase, ApiSurface};
pub use auth::Credentials;
pub use client::{parse_body, TogglClient, TogglRequest};
pub use error::TogglError;
