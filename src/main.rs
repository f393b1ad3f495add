//! Guitar tuner voice skill
//!
//! Webhook server that routes voice platform requests through an ordered
//! chain of intent handlers and answers with spoken responses.

mod api;
mod config;
mod envelope;
mod response;
mod runtime;
mod session;
mod skill;

use api::{create_router, AppState};
use config::SkillConfig;
use runtime::SkillRuntime;
use session::InMemorySessionStore;
use skill::Skill;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tuner_skill=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = SkillConfig::from_env()?;

    let skill = Skill::tuner(config.audio_base_url.clone());
    tracing::info!(
        handlers = ?skill.handler_names(),
        audio_base_url = %config.audio_base_url,
        "Skill initialized"
    );

    let sessions = InMemorySessionStore::with_idle_ttl(config.session_idle_ttl);
    let runtime = SkillRuntime::new(Arc::new(skill), Arc::new(sessions));
    let state = AppState::new(runtime, config.static_dir.clone());

    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(static_dir = %config.static_dir.display(), "Tuner skill listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down cleanly");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        () = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
