//! Attestra maintenance worker runtime.
//!
//! Validates the retention and throttle configuration once at startup,
//! then drives the two periodic maintenance jobs: sweeping expired rate
//! limit windows and applying retention lifecycle transitions to stored
//! request records.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;
use std::time::Duration;

use attestra_application::{Clock, LifecycleService, WindowStore};
use attestra_core::{AppError, AppResult};
use attestra_domain::{RetentionPolicy, ThrottleConfig};
use attestra_infrastructure::{
    InMemoryWindowStore, PostgresRequestRecordStore, RedisWindowStore, SystemClock, WindowSweeper,
};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
enum WindowStoreConfig {
    Memory,
    Redis(String),
}

#[derive(Debug, Clone)]
struct WorkerConfig {
    database_url: String,
    window_store: WindowStoreConfig,
    throttle: ThrottleConfig,
    retention: RetentionPolicy,
    sweep_interval_ms: u64,
    lifecycle_interval_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::load()?;

    // Downstream lifecycle logic assumes the stage ordering
    // unconditionally, so an invalid configuration must never get past
    // startup.
    config.retention.validate()?;
    for warning in config.throttle.validate()? {
        warn!(%warning, "throttle configuration warning");
    }

    let pool = connect_pool(config.database_url.as_str()).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let window_store: Arc<dyn WindowStore> = match &config.window_store {
        WindowStoreConfig::Memory => Arc::new(InMemoryWindowStore::new(clock.clone())),
        WindowStoreConfig::Redis(url) => {
            let client = redis::Client::open(url.as_str())
                .map_err(|error| AppError::Configuration(format!("invalid REDIS_URL: {error}")))?;
            Arc::new(RedisWindowStore::new(client, "attestra:windows"))
        }
    };

    let records = Arc::new(PostgresRequestRecordStore::new(pool));
    let lifecycle = LifecycleService::new(records, config.retention, clock);

    let sweeper = WindowSweeper::start(
        window_store,
        Duration::from_millis(config.sweep_interval_ms),
    );

    info!(
        sweep_interval_ms = config.sweep_interval_ms,
        lifecycle_interval_ms = config.lifecycle_interval_ms,
        "attestra-worker started"
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(config.lifecycle_interval_ms));
    loop {
        tokio::select! {
            _ = ticker.tick() => match lifecycle.run_transitions().await {
                Ok(report) => info!(
                    expired = report.expired,
                    archived = report.archived,
                    purged = report.purged,
                    "retention transitions applied"
                ),
                Err(error) => warn!(error = %error, "retention transition pass failed"),
            },
            result = tokio::signal::ctrl_c() => {
                if let Err(error) = result {
                    warn!(error = %error, "failed to listen for shutdown signal");
                }
                break;
            }
        }
    }

    sweeper.stop().await;
    info!("attestra-worker stopped");

    Ok(())
}

async fn connect_pool(database_url: &str) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

impl WorkerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;

        let window_store = match env::var("WINDOW_STORE")
            .unwrap_or_else(|_| "memory".to_owned())
            .as_str()
        {
            "memory" => WindowStoreConfig::Memory,
            "redis" => WindowStoreConfig::Redis(required_env("REDIS_URL")?),
            other => {
                return Err(AppError::Configuration(format!(
                    "WINDOW_STORE must be either 'memory' or 'redis', got '{other}'"
                )));
            }
        };

        let throttle = match env::var("THROTTLE_POLICIES") {
            Ok(raw) => ThrottleConfig::from_json(raw.as_str())?,
            Err(_) => ThrottleConfig::default(),
        };

        let retention = RetentionPolicy {
            expiry_days: required_env_f64("RETENTION_EXPIRY_DAYS")?,
            archive_days: required_env_f64("RETENTION_ARCHIVE_DAYS")?,
            delete_days: required_env_f64("RETENTION_DELETE_DAYS")?,
        };

        let sweep_interval_ms = parse_env_u64("SWEEP_INTERVAL_MS", 300_000)?;
        let lifecycle_interval_ms = parse_env_u64("LIFECYCLE_INTERVAL_MS", 3_600_000)?;

        if sweep_interval_ms == 0 {
            return Err(AppError::Configuration(
                "SWEEP_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        if lifecycle_interval_ms == 0 {
            return Err(AppError::Configuration(
                "LIFECYCLE_INTERVAL_MS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            window_store,
            throttle,
            retention,
            sweep_interval_ms,
            lifecycle_interval_ms,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name).map_err(|_| AppError::Configuration(format!("{name} is required")))
}

fn required_env_f64(name: &str) -> AppResult<f64> {
    required_env(name)?.parse::<f64>().map_err(|error| {
        AppError::Configuration(format!("invalid {name} value: {error}"))
    })
}

fn parse_env_u64(name: &str, default: u64) -> AppResult<u64> {
    match env::var(name) {
        Ok(value) => value.parse::<u64>().map_err(|error| {
            AppError::Configuration(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}
