//! HTTP route handlers.

pub mod health;
pub mod menu;

use axum::Router;

use crate::state::AppState;

/// All kernel routes, without middleware layers.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(menu::router())
}
