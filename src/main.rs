use sessiond::{
    api::start_api_server,
    auth::{CleanupService, SessionService},
    config::Config,
    observability::{init_observability, log_config_info},
    storage::{create_pool, run_migrations},
    Result, APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing).
    // This must happen before any config is read from the environment.
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = Config::from_env()?;
    init_observability(&config.observability)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting sessiond session termination service");
    log_config_info(&config);

    let pool = create_pool(&config.database).await?;
    if config.database.auto_migrate {
        run_migrations(&pool).await?;
    }

    let session_service = SessionService::with_sqlx(pool.clone());
    let cleanup_service = CleanupService::with_sqlx(pool);

    // Background worker sweeping overdue sessions to `expired`.
    let cleanup_interval = config.session.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            match cleanup_service.run_once().await {
                Ok(expired) if expired > 0 => {
                    info!(count = expired, "Cleanup worker expired overdue sessions");
                }
                Ok(_) => {}
                Err(e) => {
                    error!(error = %e, "Cleanup worker failed to sweep sessions");
                }
            }
        }
    });

    if let Err(e) = start_api_server(config.api.clone(), session_service).await {
        error!("API server terminated with error: {}", e);
        std::process::exit(1);
    }

    info!("sessiond shutdown completed");
    Ok(())
}
