//! Shift API server binary.
//!
//! Connects to PostgreSQL, applies migrations, schedules the nightly
//! retention sweep and serves the REST API until Ctrl-C.

use std::sync::Arc;

use clap::Parser;
use shift_api::config::{ApiConfig, Environment};
use shift_core::auth::jwt::{default_secret_path, load_or_generate_secret};
use shift_core::clock::SystemClock;
use shift_core::mail::{LogMailer, Mailer, SmtpMailer, SmtpSettings};
use shift_core::retention::{PgRetentionStore, RetentionSweeper, schedule_daily_sweep};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

const DEFAULT_LOG_FILTER: &str = "info,shift_api=debug,shift_core=debug";

/// CLI arguments. Every flag falls back to an environment variable.
#[derive(Parser, Debug)]
#[command(name = "shift_api_server", about = "Shift journaling API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8080")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/shift"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    max_connections: u32,

    /// development, production or test.
    #[arg(long, env = "APP_ENV", default_value = "development")]
    environment: Environment,

    /// JWT signing secret. When absent a persisted random secret is used.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Passphrase the entry-content key is derived from.
    #[arg(long, env = "CONTENT_ENCRYPTION_KEY", hide_env_values = true)]
    content_key: String,

    /// Public URL of the web app; email links point here.
    #[arg(long, env = "APP_URL", default_value = "http://localhost:3000")]
    app_url: Url,

    /// SMTP relay host. Emails are only logged when unset.
    #[arg(long, env = "SMTP_HOST")]
    smtp_host: Option<String>,

    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    smtp_port: u16,

    #[arg(long, env = "SMTP_USER")]
    smtp_user: Option<String>,

    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    smtp_password: Option<String>,

    #[arg(long, env = "SMTP_FROM", default_value = "Shift <no-reply@shift.local>")]
    smtp_from: String,
}

impl Args {
    fn smtp(&self) -> Option<SmtpSettings> {
        self.smtp_host.as_ref().map(|host| SmtpSettings {
            host: host.clone(),
            port: self.smtp_port,
            username: self.smtp_user.clone(),
            password: self.smtp_password.clone(),
            from: self.smtp_from.clone(),
        })
    }

    fn into_config(self) -> ApiConfig {
        let smtp = self.smtp();
        let jwt_secret = self
            .jwt_secret
            .unwrap_or_else(|| load_or_generate_secret(&default_secret_path()));
        ApiConfig {
            bind_addr: self.bind_addr,
            pg_connection_url: self.database_url,
            environment: self.environment,
            jwt_secret,
            content_key: self.content_key,
            app_url: self.app_url,
            smtp,
        }
    }
}

/// Cancel `shutdown` once `signal` fires. A listener that cannot be installed
/// leaves the server running without graceful shutdown.
async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("interrupt received, shutting down");
            shutdown.cancel();
        }
        Err(e) => warn!(error = %e, "could not listen for Ctrl-C; graceful shutdown disabled"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let args = Args::parse();
    let max_connections = args.max_connections;
    let config = args.into_config();

    info!(?config, "starting shift_api_server");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    info!("running database migrations");
    shift_api::migrate(&pool).await?;

    let mailer: Arc<dyn Mailer> = match config.smtp.clone() {
        Some(settings) => Arc::new(SmtpMailer::new(settings)?),
        None => {
            warn!("SMTP_HOST not set, outgoing emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let sweeper = Arc::new(RetentionSweeper::new(
        Arc::new(PgRetentionStore::new(pool.clone())),
        Arc::new(SystemClock),
    ));
    let mut scheduler = schedule_daily_sweep(sweeper).await?;

    let bind_addr = config.bind_addr.clone();
    let app = shift_api::router(shift_api::AppState::new(pool, config, mailer));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), shutdown.clone()));

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    if let Err(e) = scheduler.shutdown().await {
        warn!(error = %e, "retention scheduler did not stop cleanly");
    }

    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_cancels_the_token() {
        let shutdown = CancellationToken::new();
        cancel_on_signal(async { Ok(()) }, shutdown.clone()).await;
        assert!(shutdown.is_cancelled());
    }

    #[tokio::test]
    async fn failed_listener_keeps_the_server_running() {
        let shutdown = CancellationToken::new();
        let failing = async { Err(std::io::Error::other("no signal handler")) };
        cancel_on_signal(failing, shutdown.clone()).await;
        assert!(!shutdown.is_cancelled());
    }
}
