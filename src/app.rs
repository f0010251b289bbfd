use std::fmt::Debug;
use std::sync::Arc;

use clap::Parser;
use garde::Validate;
use sea_orm_migration::MigratorTrait;
use tokio::signal;
use tracing::info;
use tracing::instrument;

use crate::config::Backend;
use crate::config::Config;
use crate::db::driver::DatabaseDriver;
use crate::db::migrations::Migrator;
use crate::db::DbGateway;
use crate::error::Result;
use crate::error::StarError;
use crate::http;
use crate::service::StarService;

/// The star board server: configuration, tracing, database, service and HTTP put together.
pub struct StarApp {
    config: Config,
}

impl StarApp {
    /// Build from the process command line and environment.
    pub fn from_env() -> Result<Self> {
        Self::with_config(Config::try_parse()?)
    }

    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString> + Clone,
    {
        Self::with_config(Config::try_parse_from(args)?)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn setup_tracing(&self) -> Result<()> {
        use std::io;
        use std::sync::Mutex;
        use tracing_subscriber::layer::SubscriberExt;
        use tracing_subscriber::util::SubscriberInitExt;
        use tracing_subscriber::EnvFilter;

        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(self.config.log_level())?,
        };

        let dest_writer = Mutex::new(if let Some(log_file) = self.config.log_file() {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(log_file)?;
            Box::new(file) as Box<dyn io::Write + Send>
        }
        else {
            Box::new(io::stdout()) as Box<dyn io::Write + Send>
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(dest_writer))
            .try_init()?;

        info!("Tracing initialized");

        Ok(())
    }

    async fn connect(&self) -> Result<Arc<dyn DatabaseDriver>> {
        let config = &self.config;

        match config.backend() {
            #[cfg(feature = "pg")]
            Backend::Pg => {
                let pg = crate::db::driver::pg::Pg::builder()
                    .host(config.pg_host())
                    .port(config.pg_port())
                    .user(config.pg_user())
                    .password(config.pg_password())
                    .database(config.pg_database())
                    .build()
                    .map_err(|err| StarError::Config(err.to_string()))?;
                pg.connect().await?;
                Ok(pg)
            }
            #[cfg(feature = "sqlite")]
            Backend::Sqlite => Ok(Arc::new(
                crate::db::driver::sqlite::Sqlite::connect(&config.sqlite_path()).await?,
            )),
            #[allow(unreachable_patterns)]
            backend => Err(StarError::Config(format!(
                "{backend:?} support is not enabled, rebuild with the corresponding cargo feature"
            ))),
        }
    }

    #[instrument(level = "debug", skip(self, driver), fields(driver = driver.name()))]
    async fn db_prepare(&self, driver: &dyn DatabaseDriver) -> Result<()> {
        driver.configure().await?;
        Migrator::up(&driver.connection(), None).await?;
        info!("Database schema is up to date.");
        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        self.setup_tracing()?;

        let driver = self.connect().await?;
        self.db_prepare(driver.as_ref()).await?;

        let gateway = Arc::new(DbGateway::new(driver));
        let service = Arc::new(StarService::start(self.config.service_settings()?, gateway).await?);

        let addr = self.config.listen_addr()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "Serving stars");

        axum::serve(listener, http::router(service.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped, shutting down the service.");
        if let Some(report) = service.shutdown().await? {
            info!(stored = report.stored, dropped = report.dropped, "Write worker summary");
        }

        Ok(())
    }

    pub async fn run() -> Result<()> {
        Self::from_env()?.execute().await
    }
}

impl Debug for StarApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StarApp {{ backend: {:?} }}", self.config.backend())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_is_refused() {
        assert!(StarApp::from_args(["star-server", "--slot-count", "0"]).is_err());
        assert!(StarApp::from_args(["star-server", "--no-such-option"]).is_err());
    }

    #[test]
    fn test_from_args() {
        let app = StarApp::from_args(["star-server", "--backend", "sqlite", "--sqlite-path", "/tmp/x.db"]).unwrap();
        assert_eq!(app.config().backend(), Backend::Sqlite);
        assert_eq!(app.config().sqlite_path(), std::path::PathBuf::from("/tmp/x.db"));
    }
}
