use agri_server::{app::app, config::AppConfig, migrator};
use anyhow::Context;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::Database;
use sea_orm_migration::MigratorTrait;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    agri_server::telemetry::init_telemetry("agri-server").context("Failed to start telemetry")?;

    let config = AppConfig::from_env()?;

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    let db = Database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    migrator::Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;

    agri_server::metrics::init_metrics(&db).await;

    let app = app(db, config.cookie_key, config.cors_origin)
        .context("Failed to compile templates")?
        .layer(prometheus_layer)
        .route("/metrics", get(move || render_metrics(metric_handle.clone())));

    tracing::info!("listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn render_metrics(handle: PrometheusHandle) -> String {
    handle.render()
}
