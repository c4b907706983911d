use anyhow::Context;
use event_manager::{
    config::get_configuration,
    db::{establish_connection, run_migrations},
    server::app::run_server,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let settings = get_configuration().context("Cannot read configuration")?;
    let pool = establish_connection(&settings.db_path)
        .await
        .with_context(|| format!("Cannot connect to {}", settings.db_path))?;
    run_migrations(&pool).await.context("Cannot run migrations")?;
    run_server(pool, &settings).await
}
