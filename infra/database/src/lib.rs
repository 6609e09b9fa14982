//! # Database Infrastructure
//!
//! Connection handling for [SurrealDB](https://surrealdb.com) through the `any` engine
//! (`mem://`, `ws://`, `http://`).
//!
//! * **Bounded**: connecting and probing never wait longer than the configured timeout.
//! * **Single attempt**: `init` tries once; callers decide when to try again.
//! * **Self-migrating**: the schema is applied idempotently on every successful connect.
//!
//! ## Example
//!
//! ```rust
//! use rollcall_database::{Database, DatabaseError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DatabaseError> {
//!     let db = Database::builder()
//!         .url("mem://")
//!         .session("rollcall", "attendance")
//!         .init()
//!         .await?;
//!
//!     db.probe(std::time::Duration::from_secs(1)).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod migrations;

pub use error::{DatabaseError, DatabaseErrorExt};
pub use migrations::MigrationReport;
pub use surrealdb;

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use rollcall_domain::config::DatabaseConfig;
use surrealdb::Surreal;
use surrealdb::engine::any::{Any, connect};
use surrealdb::opt::auth::Root;
use tracing::{info, instrument};

use crate::migrations::MigrationRunner;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct DatabaseInner {
    instance: Surreal<Any>,
    ns: String,
    db: String,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        info!(ns = %self.ns, db = %self.db, "SurrealDB session handle dropped");
    }
}

/// Cloneable `SurrealDB` session scoped to one namespace and database.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::new()
    }

    /// Round-trips a health request, bounded by `timeout`.
    ///
    /// # Errors
    /// [`DatabaseError::Connection`] if the engine is unhealthy or does not answer in time.
    pub async fn probe(&self, timeout: Duration) -> Result<(), DatabaseError> {
        bounded(timeout, "Probing database", self.inner.instance.health()).await
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.inner.ns
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.inner.db
    }
}

impl Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.inner.instance
    }
}

/// A fluent builder for configuring and establishing a `SurrealDB` connection.
#[must_use = "builders do nothing unless you call .init()"]
#[derive(Debug)]
pub struct DatabaseBuilder {
    url: Option<String>,
    ns: Option<String>,
    db: Option<String>,
    auth: Option<(String, String)>,
    connect_timeout: Duration,
    migrate: bool,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self {
            url: None,
            ns: None,
            db: None,
            auth: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            migrate: true,
        }
    }
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-fills every parameter from the service configuration.
    pub fn from_config(config: &DatabaseConfig) -> Self {
        let builder = Self::new()
            .url(&config.url)
            .session(&config.namespace, &config.database)
            .connect_timeout(config.probe_timeout);

        match &config.credentials {
            Some(credentials) => builder.auth(&credentials.username, &credentials.password),
            None => builder,
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace and database name.
    pub fn session(mut self, namespace: impl Into<String>, database: impl Into<String>) -> Self {
        self.ns = Some(namespace.into());
        self.db = Some(database.into());
        self
    }

    /// Signs in as a root user after connecting.
    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((username.into(), password.into()));
        self
    }

    /// Upper bound for establishing the connection and the first health check.
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Skips schema migrations (useful against read-only replicas).
    pub const fn skip_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    /// Connects once and prepares the session.
    ///
    /// # Process
    /// 1. **Validation**: URL, namespace and database must be set.
    /// 2. **Engine**: connect and run one health check, both within `connect_timeout`.
    /// 3. **Authentication**: root sign-in when credentials were given.
    /// 4. **Session**: select namespace and database.
    /// 5. **Schema**: apply pending migrations.
    ///
    /// # Errors
    /// * [`DatabaseError::Validation`] if required parameters are missing.
    /// * [`DatabaseError::Connection`] if the engine is unreachable, unhealthy or too slow.
    /// * [`DatabaseError::Auth`] if the credentials are rejected.
    /// * [`DatabaseError::Surreal`] / [`DatabaseError::Migration`] for session or schema failures.
    #[instrument(skip(self), fields(url = ?self.url, ns = ?self.ns, db = ?self.db))]
    pub async fn init(self) -> Result<Database, DatabaseError> {
        let url = required(self.url, "URL is required")?;
        let ns = required(self.ns, "Namespace is required")?;
        let db = required(self.db, "Database is required")?;

        let instance = bounded(self.connect_timeout, "Initializing engine", async {
            let instance = connect(url.as_str()).await?;
            instance.health().await?;
            Ok(instance)
        })
        .await?;

        if let Some((username, password)) = &self.auth {
            instance.signin(Root { username, password }).await.map_err(|e| {
                DatabaseError::Auth { message: e.to_string().into(), context: Some(url.clone().into()) }
            })?;
        }

        instance.use_ns(&ns).use_db(&db).await.context("Activating session")?;

        let version =
            instance.version().await.map_or_else(|_| "unknown".to_owned(), |v| v.to_string());
        info!(namespace = %ns, database = %db, %version, "SurrealDB connection established");

        if self.migrate {
            let report = MigrationRunner::new(&instance).run().await?;
            info!(
                applied = report.applied.len(),
                skipped = report.skipped.len(),
                "Database schema is up to date"
            );
        }

        Ok(Database { inner: Arc::new(DatabaseInner { instance, ns, db }) })
    }
}

fn required(value: Option<String>, message: &'static str) -> Result<String, DatabaseError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DatabaseError::Validation { message: message.into(), context: None })
}

async fn bounded<T>(
    timeout: Duration,
    step: &'static str,
    fut: impl Future<Output = Result<T, surrealdb::Error>>,
) -> Result<T, DatabaseError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            Err(DatabaseError::Connection { message: e.to_string().into(), context: Some(step.into()) })
        },
        Err(_) => Err(DatabaseError::Connection {
            message: format!("no answer within {}ms", timeout.as_millis()).into(),
            context: Some(step.into()),
        }),
    }
}
