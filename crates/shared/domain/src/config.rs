use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::{defaults, env};

/// Immutable process configuration, created once at startup.
#[derive(Default, Debug, Clone)]
pub struct AppConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub database: Option<DatabaseConfig>,
    pub logging: LoggingConfig,
    pub env_file: EnvFileStatus,
    /// Bind hints that were set but have no effect.
    pub ignored_vars: Vec<String>,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone)]
pub struct AppConfig {
    inner: Arc<AppConfigInner>,
}

impl AppConfig {
    #[must_use]
    pub fn new(inner: AppConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

impl From<AppConfigInner> for AppConfig {
    fn from(inner: AppConfigInner) -> Self {
        Self::new(inner)
    }
}

impl Deref for AppConfig {
    type Target = AppConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for AppConfig {
    fn deref_mut(&mut self) -> &mut AppConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP listener and routing configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Always the unspecified IPv4 address; host hints from the environment are ignored.
    pub host: IpAddr,
    pub port: u16,
    /// Normalized mount point of the API documentation (leading `/`, no trailing `/`).
    pub docs_prefix: String,
    pub request_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: defaults::PORT,
            docs_prefix: defaults::DOCS_PREFIX.to_owned(),
            request_timeout: Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Token signing and verification settings.
#[derive(Clone, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Shared HS256 secret. `None` disables every authenticated route.
    pub secret: Option<String>,
    pub token_ttl_minutes: u64,
    pub leeway_seconds: u64,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            secret: None,
            token_ttl_minutes: defaults::TOKEN_TTL_MINUTES,
            leeway_seconds: defaults::TOKEN_LEEWAY_SECONDS,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

/// `SurrealDB` connection parameters. Present only when a URL could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub credentials: Option<DatabaseCredentials>,
    /// Upper bound for a single connect-and-probe cycle.
    pub probe_timeout: Duration,
    /// How long an availability answer is reused. Zero probes on every check.
    pub availability_ttl: Duration,
}

impl DatabaseConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: defaults::DATABASE_NAMESPACE.to_owned(),
            database: defaults::DATABASE_NAME.to_owned(),
            credentials: None,
            probe_timeout: Duration::from_millis(defaults::DATABASE_PROBE_TIMEOUT_MS),
            availability_ttl: Duration::from_millis(defaults::DATABASE_GATE_TTL_MS),
        }
    }
}

/// `SurrealDB` root credentials (optional for unauthenticated engines like `mem://`).
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DatabaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Logging output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `RUST_LOG`-style directive string.
    pub filter: Option<String>,
    /// Enables the daily rolling file writer.
    pub directory: Option<PathBuf>,
    pub json: bool,
}

/// Outcome of looking for the local env file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvFileStatus {
    Loaded(PathBuf),
    #[default]
    Absent,
    Unreadable { path: PathBuf, reason: String },
}

/// Variables that other hosting frameworks use for the bind address.
pub const IGNORED_BIND_HINTS: [&str; 3] = [env::HOST, env::FLASK_RUN_HOST, env::FLASK_RUN_PORT];
