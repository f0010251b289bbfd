use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use fieldx::fxstruct;
use garde::Validate;

use crate::error::Result;
use crate::error::StarError;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    #[default]
    Pg,
    Sqlite,
}

/// Tunables of [`StarService`](crate::service::StarService).
#[derive(Debug, Clone, Validate)]
#[fxstruct(no_new, builder, get(copy))]
pub struct ServiceSettings {
    /// Number of precomputed slots in the cache.
    #[fieldx(default(30))]
    #[garde(range(min = 1))]
    slot_count: usize,

    /// Stars per slot.
    #[fieldx(default(20))]
    #[garde(range(min = 1))]
    slot_size: usize,

    #[fieldx(default(Duration::from_secs(20)))]
    #[garde(custom(Self::non_zero))]
    refresh_interval: Duration,

    /// Maximum number of stars waiting to be persisted.
    #[fieldx(default(500))]
    #[garde(range(min = 1))]
    queue_capacity: usize,

    /// How long a producer may wait for room in a full queue. Zero means "don't wait at all".
    #[fieldx(default(Duration::from_secs(1)))]
    #[garde(skip)]
    enqueue_timeout: Duration,
}

impl ServiceSettings {
    fn non_zero(value: &Duration, _: &()) -> garde::Result {
        if value.is_zero() {
            Err(garde::Error::new("must be greater than zero"))
        }
        else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, clap::Parser, Validate)]
#[fxstruct(no_new, get(copy))]
#[clap(about, version, name = "star-server")]
pub struct Config {
    /// Number of precomputed sample slots.
    #[clap(long, env = "STARS_SLOT_COUNT", default_value_t = 30)]
    #[garde(range(min = 1))]
    slot_count: usize,

    /// Number of stars in each slot.
    #[clap(long, env = "STARS_SLOT_SIZE", default_value_t = 20)]
    #[garde(range(min = 1))]
    slot_size: usize,

    /// Seconds between two cache refreshes.
    #[clap(long, env = "STARS_REFRESH_INTERVAL_SECS", default_value_t = 20)]
    #[garde(range(min = 1))]
    refresh_interval_secs: u64,

    /// Maximum number of stars waiting to be written to the database.
    #[clap(long, env = "STARS_QUEUE_CAPACITY", default_value_t = 500)]
    #[garde(range(min = 1))]
    queue_capacity: usize,

    /// How long, in milliseconds, a request may wait for room in a full write queue.
    #[clap(long, env = "STARS_ENQUEUE_TIMEOUT_MS", default_value_t = 1000)]
    #[garde(skip)]
    enqueue_timeout_ms: u64,

    /// Address to serve HTTP on.
    #[clap(long, env = "STARS_LISTEN", default_value = "0.0.0.0:8080")]
    #[fieldx(get(clone))]
    #[garde(custom(Self::socket_addr))]
    listen: String,

    /// Database backend.
    #[clap(long, value_enum, env = "STARS_BACKEND", default_value_t = Backend::Pg)]
    #[garde(skip)]
    backend: Backend,

    #[clap(long, env = "STARS_PG_HOST", default_value = "localhost")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_host: String,

    #[clap(long, env = "STARS_PG_PORT", default_value_t = 5432)]
    #[garde(skip)]
    pg_port: u16,

    #[clap(long, env = "STARS_PG_USER", default_value = "stars")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_user: String,

    #[clap(long, env = "STARS_PG_PASSWORD", hide_env_values = true, default_value = "stars")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_password: String,

    #[clap(long, env = "STARS_PG_DATABASE", default_value = "stars")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    pg_database: String,

    /// SQLite database file. Created if missing.
    #[clap(long, env = "STARS_SQLITE_PATH", default_value = "stars.db")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    sqlite_path: PathBuf,

    /// Log filter used when RUST_LOG is not set.
    #[clap(long, env = "STARS_LOG_LEVEL", default_value = "info")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    log_level: String,

    /// File to send log into instead of stdout.
    #[clap(long, env = "STARS_LOG_FILE")]
    #[fieldx(get(clone))]
    #[garde(skip)]
    log_file: Option<PathBuf>,
}

impl Config {
    fn socket_addr(value: &str, _: &()) -> garde::Result {
        value
            .parse::<SocketAddr>()
            .map(|_| ())
            .map_err(|err| garde::Error::new(format!("'{value}' is not a socket address: {err}")))
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|err| StarError::Config(format!("bad listen address '{}': {err}", self.listen)))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(self.enqueue_timeout_ms)
    }

    pub fn service_settings(&self) -> Result<ServiceSettings> {
        ServiceSettings::builder()
            .slot_count(self.slot_count)
            .slot_size(self.slot_size)
            .refresh_interval(self.refresh_interval())
            .queue_capacity(self.queue_capacity)
            .enqueue_timeout(self.enqueue_timeout())
            .build()
            .map_err(|err| StarError::Config(err.to_string()))
    }
}
