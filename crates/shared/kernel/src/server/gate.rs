use std::fmt;
use std::sync::Arc;

use moka::future::Cache;
use rollcall_database::{Database, DatabaseBuilder, DatabaseError};
use rollcall_domain::availability::{DatabaseAvailability, UnavailableReason};
use rollcall_domain::config::DatabaseConfig;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

struct GateInner {
    config: Option<DatabaseConfig>,
    connection: OnceCell<Database>,
    /// Single-entry answer cache; absent when the TTL is zero.
    cache: Option<Cache<(), DatabaseAvailability>>,
}

/// Precondition check in front of every persistence-backed handler.
///
/// The connection is opened lazily on the first check and reused afterwards.
/// Every probe is bounded by the configured timeout, and concurrent checks
/// share a single in-flight probe.
#[derive(Clone)]
pub struct DatabaseGate {
    inner: Arc<GateInner>,
}

impl DatabaseGate {
    #[must_use]
    pub fn new(config: Option<DatabaseConfig>) -> Self {
        let cache = config.as_ref().filter(|c| !c.availability_ttl.is_zero()).map(|c| {
            Cache::builder().max_capacity(1).time_to_live(c.availability_ttl).build()
        });

        Self { inner: Arc::new(GateInner { config, connection: OnceCell::new(), cache }) }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.config.is_some()
    }

    /// Reports whether the database can serve requests right now.
    ///
    /// Without connection parameters this returns `Unavailable(NotConfigured)`
    /// without any I/O.
    pub async fn check(&self) -> DatabaseAvailability {
        let Some(config) = &self.inner.config else {
            return DatabaseAvailability::Unavailable(UnavailableReason::NotConfigured);
        };

        match &self.inner.cache {
            Some(cache) => cache.get_with((), self.probe(config)).await,
            None => self.probe(config).await,
        }
    }

    /// Checks availability and hands out the shared connection.
    ///
    /// # Errors
    /// The [`UnavailableReason`] when the gate is closed.
    pub async fn acquire(&self) -> Result<Database, UnavailableReason> {
        match self.check().await {
            DatabaseAvailability::Available => {
                self.inner.connection.get().cloned().ok_or(UnavailableReason::ConnectionError)
            },
            DatabaseAvailability::Unavailable(reason) => Err(reason),
        }
    }

    async fn probe(&self, config: &DatabaseConfig) -> DatabaseAvailability {
        let attempt = async {
            let db = self
                .inner
                .connection
                .get_or_try_init(|| DatabaseBuilder::from_config(config).init())
                .await?;
            db.probe(config.probe_timeout).await?;
            Ok::<_, DatabaseError>(())
        };

        match tokio::time::timeout(config.probe_timeout, attempt).await {
            Ok(Ok(())) => {
                debug!(url = %config.url, "Database probe succeeded");
                DatabaseAvailability::Available
            },
            Ok(Err(e)) => {
                warn!(url = %config.url, error = %e, "Database probe failed");
                DatabaseAvailability::Unavailable(UnavailableReason::ConnectionError)
            },
            Err(_) => {
                warn!(
                    url = %config.url,
                    timeout_ms = config.probe_timeout.as_millis(),
                    "Database probe timed out"
                );
                DatabaseAvailability::Unavailable(UnavailableReason::ConnectionError)
            },
        }
    }
}

impl fmt::Debug for DatabaseGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseGate")
            .field("config", &self.inner.config)
            .field("connected", &self.inner.connection.initialized())
            .field("cached", &self.inner.cache.is_some())
            .finish()
    }
}
