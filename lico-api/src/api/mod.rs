//! HTTP API handlers for lico-api
//!
//! Each module exposes a `routes()` builder; [`session_routes`] gathers the
//! ones that sit behind [`require_session`].

use axum::Router;

use crate::AppState;

pub mod assessments;
pub mod auth;
pub mod automations;
pub mod chat;
pub mod creative;
pub mod cron;
pub mod extract;
pub mod finance;
pub mod habits;
pub mod health;
pub mod insights;
pub mod journal;
pub mod moods;
pub mod notifications;
pub mod social;
pub mod validate;

pub use auth::{require_session, AuthSession};
pub use cron::require_cron_secret;
pub use health::health_routes;

/// Routes that need a session bearer token
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::session_routes())
        .merge(journal::routes())
        .merge(moods::routes())
        .merge(assessments::routes())
        .merge(habits::routes())
        .merge(finance::routes())
        .merge(social::routes())
        .merge(creative::routes())
        .merge(insights::routes())
        .merge(notifications::routes())
        .merge(automations::routes())
        .merge(chat::routes())
}

/// Register and login
pub fn public_auth_routes() -> Router<AppState> {
    auth::public_routes()
}

/// Routes that need the cron secret
pub fn cron_routes() -> Router<AppState> {
    cron::routes()
}
