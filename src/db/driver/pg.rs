use std::time::Duration;

use async_trait::async_trait;
use fieldx::fxstruct;
use sea_orm::ConnectOptions;
use sea_orm::ConnectionTrait;
use sea_orm::DatabaseConnection;
use tracing::error;
use tracing::info;

use crate::error::Result;

use super::DatabaseDriver;

#[derive(Debug)]
#[fxstruct(sync, rc, no_new, builder)]
pub struct Pg {
    host:     String,
    port:     u16,
    user:     String,
    password: String,
    database: String,
    #[fieldx(default(20))]
    max_connections: u32,
    #[fieldx(inner_mut, get(off), set, builder(off))]
    connection: DatabaseConnection,
}

impl Pg {
    pub async fn connect(&self) -> Result<()> {
        let url = format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        );
        let mut opts = ConnectOptions::new(url);
        opts.max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(20))
            .max_lifetime(Duration::from_secs(60))
            .test_before_acquire(true)
            .sqlx_logging(false);

        self.set_connection(sea_orm::Database::connect(opts).await.inspect_err(|err| {
            error!(host = %self.host, port = self.port, database = %self.database, "Error connecting to PostgreSQL: {err}")
        })?);

        info!(host = %self.host, port = self.port, database = %self.database, "Connected to PostgreSQL");
        Ok(())
    }
}

#[async_trait]
impl DatabaseDriver for Pg {
    fn name(&self) -> &'static str {
        "PostgreSQL"
    }

    fn connection(&self) -> DatabaseConnection {
        self.connection.read().clone()
    }

    /// Turn off synchronous commit: star writes are best-effort already, so a lost tail on crash is acceptable.
    async fn configure(&self) -> Result<()> {
        self.connection()
            .execute_unprepared("SET synchronous_commit = off;")
            .await?;

        Ok(())
    }
}
