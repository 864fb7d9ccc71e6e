//! lico-api library - life companion HTTP service
//!
//! Session-authenticated CRUD over journals, moods, habits, finance, social
//! and creative data, plus LLM-backed insights and user automations.

use axum::Router;
use chrono::{DateTime, Utc};
use lico_common::config::InsightConfig;
use lico_common::events::EventBus;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod db;
pub mod error;
pub mod llm;
pub mod pagination;
pub mod services;

use llm::TextGenerator;
use services::AutomationEngine;

/// Runtime settings handlers need after startup
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Expected bearer token on cron routes; None rejects every cron call
    pub cron_secret: Option<String>,
    pub insights: InsightConfig,
    pub session_ttl_hours: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cron_secret: None,
            insights: InsightConfig::default(),
            session_ttl_hours: 24 * 30,
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub event_bus: EventBus,
    pub llm: Arc<dyn TextGenerator>,
    /// Runs routines for the scheduled cron pass
    pub engine: AutomationEngine,
    pub config: Arc<ServiceConfig>,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        event_bus: EventBus,
        llm: Arc<dyn TextGenerator>,
        config: ServiceConfig,
    ) -> Self {
        let engine = AutomationEngine::new(db.clone(), llm.clone());
        Self {
            db,
            event_bus,
            llm,
            engine,
            config: Arc::new(config),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
///
/// `/health`, register and login are public. Everything else under `/api`
/// needs a session bearer token, except `/api/cron/*` which needs the cron
/// secret.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;

    let protected = api::session_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::require_session,
    ));

    let cron = api::cron_routes().layer(middleware::from_fn_with_state(
        state.clone(),
        api::require_cron_secret,
    ));

    let public = Router::new()
        .merge(api::health_routes())
        .merge(api::public_auth_routes());

    Router::new()
        .merge(protected)
        .merge(cron)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
