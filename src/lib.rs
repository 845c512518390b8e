//! TrackOps: a typed client, entity stores and CLI for the TrackOps
//! project and infrastructure tracking API.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod guard;
pub mod logging;
pub mod mock;
pub mod notify;
pub mod pagination;
pub mod store;
