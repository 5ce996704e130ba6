//! Yatube server entry point.

use actix_web::{App, HttpServer, web};
use tracing_actix_web::TracingLogger;

use web_server::observability::RequestIdMiddleware;
use web_server::telemetry::{TelemetryConfig, init_telemetry};
use web_server::{AppConfig, AppState, configure_routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    init_telemetry(&TelemetryConfig::from_env());

    let config = AppConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "Starting Yatube server");

    let state = AppState::new(&config).await;

    #[cfg(feature = "scheduler")]
    let _scheduler = start_scheduler(&state).await;

    HttpServer::new(move || {
        App::new()
            .wrap(RequestIdMiddleware)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

/// Start the cache sweeper. Scheduler failures are logged, never fatal.
#[cfg(feature = "scheduler")]
async fn start_scheduler(state: &AppState) -> Option<web_server::background::Scheduler> {
    use web_server::background::{Scheduler, SchedulerConfig, schedule_cache_sweep};

    let scheduler = match Scheduler::new(SchedulerConfig::from_env()).await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create scheduler");
            return None;
        }
    };

    if let Some(cache) = state.memory_cache.clone() {
        if let Err(e) = schedule_cache_sweep(&scheduler, cache).await {
            tracing::error!(error = %e, "Failed to register cache sweep");
        }
    }

    if let Err(e) = scheduler.start().await {
        tracing::error!(error = %e, "Failed to start scheduler");
        return None;
    }
    Some(scheduler)
}
