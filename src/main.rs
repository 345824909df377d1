use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_backend::api::router;
use todo_backend::config::AppConfig;
use todo_backend::db;
use todo_backend::services::{TodoService, UpdateRuleSet, past_due};
use todo_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::new_from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = db::connect(&config.database_url, config.db_max_connections).await?;

    let (publisher, listener) = past_due::channel(pool.clone());
    tokio::spawn(listener.start());

    let rules = UpdateRuleSet::default();
    info!(rules = ?rules.names(), "update rules registered");

    let todos = TodoService::new(pool.clone(), rules, publisher);
    let state = AppState { db: pool, todos };

    let app = router(state);

    info!("listening on http://{}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
