//! Axum router configuration with middleware.
//!
//! All chat routes are under `/api/v1/`; `/health` sits at the root.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::extract::State;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Sessions
        .route(
            "/sessions",
            get(handlers::session::list_sessions).post(handlers::session::create_session),
        )
        .route("/sessions/{id}", get(handlers::session::get_session))
        .route(
            "/sessions/{id}/messages",
            get(handlers::session::list_messages).post(handlers::session::send_message),
        )
        .route("/sessions/{id}/read", post(handlers::session::mark_session_read))
        // Messages
        .route("/messages/{id}/read", post(handlers::message::mark_read))
        .route("/messages/{id}/clear", post(handlers::message::clear_message))
        // Unread
        .route("/unread", get(handlers::unread::get_unread))
        // Presence
        .route("/presence", put(handlers::presence::set_presence))
        .route("/presence/{user}", get(handlers::presence::get_presence));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness plus a database round-trip (no identity required).
async fn health_check(State(state): State<AppState>) -> axum::Json<serde_json::Value> {
    let database = match sqlx::query("SELECT 1").execute(&state.db_pool.reader).await {
        Ok(_) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "Health check database ping failed");
            "unavailable"
        }
    };

    axum::Json(serde_json::json!({
        "status": "ok",
        "database": database,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
