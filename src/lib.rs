//! Showcase scaffold: a small API server, the client widget models it ships with, and the
//! pipeline that assembles both into one deployable tree.

pub mod api;
pub mod app;
pub mod config;
pub mod core;
pub mod error;
pub mod infrastructure;
pub mod pipeline;
pub mod server;
