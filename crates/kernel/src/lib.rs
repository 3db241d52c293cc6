//! Intranet Portal Kernel Library
//!
//! Navigation menus (hierarchical menu items), their storage backends, and
//! the HTTP API serving them. The `intranet` binary runs the server.

pub mod config;
pub mod db;
pub mod error;
pub mod menu;
pub mod models;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;

pub use config::Config;
pub use state::AppState;
