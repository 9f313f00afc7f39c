use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradepulse_core::dashboard::{Dashboard, SyncOutcome};
use tradepulse_core::llm::gemini::GeminiClient;

mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tradepulse_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let client = match GeminiClient::from_settings(&settings) {
        Ok(client) => client,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "cannot build Gemini client");
            return Err(e);
        }
    };
    tracing::info!(model = client.model(), "gemini client ready");

    let dashboard = Arc::new(Dashboard::new(
        Arc::new(client),
        settings.analysis_utc_offset_hours,
    ));

    // Initial load.
    tokio::spawn({
        let dashboard = dashboard.clone();
        async move {
            if let SyncOutcome::Failed(error) = dashboard.sync().await {
                sentry::capture_message(&error, sentry::Level::Error);
                tracing::warn!(%error, "initial sync failed; waiting for a manual sync");
            }
        }
    });

    let app = routes::router(routes::AppState {
        dashboard: dashboard.clone(),
    })
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(dashboard))
        .await?;

    Ok(())
}

async fn shutdown_signal(dashboard: Arc<Dashboard>) {
    let _ = tokio::signal::ctrl_c().await;
    dashboard.teardown().await;
}

fn init_sentry(settings: &tradepulse_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
