//! TrackOps API client and types.
//!
//! This module provides the interface for communicating with the TrackOps
//! REST API: the typed records, the interceptor-equipped client, the
//! pluggable transport and persisted session credentials.

pub mod auth;
mod client;
mod endpoints;
pub mod error;
pub mod transport;
pub mod types;

pub use auth::{CredentialKey, CredentialStore, KeyringStore, MemoryStore, Session};
pub use client::ApiClient;
pub use error::{ApiError, ErrorBody, Result};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

#[cfg(test)]
pub(crate) use client::tests::ScriptedTransport;
