//! Typed endpoint functions, one module per resource.
//!
//! Each module adds methods to [`ApiClient`](super::ApiClient). Paths are
//! relative to the configured base URL.

mod auth;
mod dashboard;
mod deployments;
mod issues;
mod members;
mod projects;
mod servers;
mod services;
mod sprints;
mod teams;
mod users;
