use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use request_tracker_backend::{
    config::{mask_secret, Config},
    db::{
        connection::{create_pool, run_migrations, DbPool},
        seed,
    },
    routes::build_router,
    services::{notification::transport_from_config, NotificationDispatcher},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first: it carries the log filter
    let config = Config::load()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_filter)
                .unwrap_or_else(|_| "request_tracker_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = %config.environment,
        database_url = %config.database_url,
        bind_addr = %config.bind_addr,
        time_zone = %config.time_zone,
        decision_policy = ?config.decision_policy,
        mail_enabled = config.mail.enabled,
        mail_server = %config.mail.server,
        mail_password = %mask_secret(config.mail.password.as_deref().unwrap_or_default()),
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool: DbPool = create_pool(&config.database_url, config.sql_echo).await?;
    run_migrations(&pool).await?;
    seed::seed(&pool, &config).await?;

    let transport = transport_from_config(&config.mail)?;
    let notifier = NotificationDispatcher::new(pool.clone(), transport);

    let addr = config.bind_addr;
    let app = build_router(AppState::new(pool, config, Some(notifier)));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
