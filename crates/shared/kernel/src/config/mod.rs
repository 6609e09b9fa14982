//! Environment-driven configuration.
//!
//! Values come from the live process environment and an optional local env file.
//! The file never overrides a variable that is already set. Loading never fails:
//! unparsable values fall back to their defaults and a missing secret or database
//! URL is recorded as absent.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment};
use rollcall_domain::config::{
    AppConfig, AppConfigInner, DatabaseConfig, DatabaseCredentials, EnvFileStatus,
    IGNORED_BIND_HINTS, LoggingConfig, SecurityConfig, ServerConfig,
};
use rollcall_domain::constants::{ENV_FILE, defaults, env};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::server::registrar::validate_path;

#[rollcall_derive::service_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: ::config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Every variable the service understands.
const KNOWN_VARS: &[&str] = &[
    env::JWT_SECRET,
    env::TOKEN_EXP_MIN,
    env::JWT_LEEWAY_SECONDS,
    env::PORT,
    env::DOCS_PREFIX,
    env::REQUEST_TIMEOUT_SECS,
    env::DATABASE_URL,
    env::DATABASE_HOST,
    env::DATABASE_PORT,
    env::DATABASE_NAMESPACE,
    env::DATABASE_NAME,
    env::DATABASE_USER,
    env::DATABASE_PASSWORD,
    env::DATABASE_PROBE_TIMEOUT_MS,
    env::DATABASE_GATE_TTL_MS,
    env::RUST_LOG,
    env::LOG_DIR,
    env::LOG_FORMAT,
    env::HOST,
    env::FLASK_RUN_HOST,
    env::FLASK_RUN_PORT,
];

/// Flat snapshot of the recognized variables, keyed by lowercase name.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawEnv {
    jwt_secret: Option<String>,
    token_exp_min: Option<String>,
    jwt_leeway_seconds: Option<String>,
    port: Option<String>,
    docs_prefix: Option<String>,
    request_timeout_secs: Option<String>,
    database_url: Option<String>,
    database_host: Option<String>,
    database_port: Option<String>,
    database_namespace: Option<String>,
    database_name: Option<String>,
    database_user: Option<String>,
    database_password: Option<String>,
    database_probe_timeout_ms: Option<String>,
    database_gate_ttl_ms: Option<String>,
    rust_log: Option<String>,
    log_dir: Option<String>,
    log_format: Option<String>,
}

/// Builds an [`AppConfig`] from an env file and a set of variables.
///
/// Defaults to `.env` in the working directory and the live process environment.
///
/// # Example
/// ```rust
/// use rollcall_kernel::config::ConfigLoader;
///
/// let cfg = ConfigLoader::new()
///     .without_env_file()
///     .vars([("PORT", "8080"), ("JWT_SECRET", "s3cret")])
///     .load();
///
/// assert_eq!(cfg.server.port, 8080);
/// assert!(cfg.database.is_none());
/// ```
#[derive(Debug)]
#[must_use = "call .load() to build the configuration"]
pub struct ConfigLoader {
    env_file: Option<PathBuf>,
    vars: Option<HashMap<String, String>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self { env_file: Some(PathBuf::from(ENV_FILE)), vars: None }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    pub fn without_env_file(mut self) -> Self {
        self.env_file = None;
        self
    }

    /// Replaces the process environment with an explicit set of variables.
    pub fn vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect());
        self
    }

    /// Produces the configuration snapshot. Never fails.
    pub fn load(self) -> AppConfig {
        let (file_vars, env_file) = match &self.env_file {
            Some(path) => read_env_file(path),
            None => (Vec::new(), EnvFileStatus::Absent),
        };
        let live = self.vars.unwrap_or_else(|| std::env::vars().collect());

        let mut merged: HashMap<String, String> = file_vars.into_iter().collect();
        merged.extend(live);

        let ignored_vars = IGNORED_BIND_HINTS
            .iter()
            .filter(|name| merged.get(**name).is_some_and(|v| !v.is_empty()))
            .map(|name| (*name).to_owned())
            .collect();

        let raw = snapshot(merged).unwrap_or_default();

        AppConfig::new(AppConfigInner {
            server: server_config(&raw),
            security: security_config(&raw),
            database: database_config(&raw),
            logging: logging_config(&raw),
            env_file,
            ignored_vars,
        })
    }
}

/// Loads from `.env` and the process environment.
pub fn load() -> AppConfig {
    ConfigLoader::new().load()
}

/// Logs what was loaded. Call once the logger is up.
pub fn report(cfg: &AppConfig) {
    match &cfg.env_file {
        EnvFileStatus::Loaded(path) => info!(path = %path.display(), "Loaded env file"),
        EnvFileStatus::Absent => info!("No env file found; using the process environment only"),
        EnvFileStatus::Unreadable { path, reason } => {
            warn!(path = %path.display(), %reason, "Env file could not be read; ignoring it");
        },
    }

    for name in &cfg.ignored_vars {
        debug!(variable = %name, "Ignoring bind hint; the service always binds 0.0.0.0:PORT");
    }

    if cfg.security.secret.is_none() {
        warn!("{} is not set; authenticated routes will answer 401", env::JWT_SECRET);
    }

    match &cfg.database {
        Some(db) => info!(
            url = %db.url,
            namespace = %db.namespace,
            database = %db.database,
            probe_timeout_ms = db.probe_timeout.as_millis(),
            "Database configured"
        ),
        None => warn!("No database configured; database-backed routes will answer 503"),
    }
}

fn read_env_file(path: &Path) -> (Vec<(String, String)>, EnvFileStatus) {
    let unreadable = |reason: String| EnvFileStatus::Unreadable { path: path.to_owned(), reason };

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => {
            return (Vec::new(), EnvFileStatus::Absent);
        },
        Err(e) => return (Vec::new(), unreadable(e.to_string())),
    };

    match iter.collect::<Result<Vec<_>, _>>() {
        Ok(vars) => (vars, EnvFileStatus::Loaded(path.to_owned())),
        Err(e) => (Vec::new(), unreadable(e.to_string())),
    }
}

fn snapshot(merged: HashMap<String, String>) -> Result<RawEnv, ConfigError> {
    let known: HashMap<String, String> = merged
        .into_iter()
        .filter(|(key, _)| KNOWN_VARS.contains(&key.as_str()))
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect();

    let raw = Config::builder()
        .add_source(Environment::default().source(Some(known)))
        .build()
        .context("Failed to build config")?
        .try_deserialize::<RawEnv>()
        .context("Failed to deserialize config")?;

    Ok(raw)
}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parsed<T: std::str::FromStr>(value: Option<&String>) -> Option<T> {
    present(value).and_then(|v| v.parse().ok())
}

fn server_config(raw: &RawEnv) -> ServerConfig {
    let defaults = ServerConfig::default();
    ServerConfig {
        port: parsed(raw.port.as_ref()).unwrap_or(defaults.port),
        docs_prefix: normalize_prefix(present(raw.docs_prefix.as_ref())),
        request_timeout: parsed(raw.request_timeout_secs.as_ref())
            .filter(|secs| *secs > 0)
            .map_or(defaults.request_timeout, Duration::from_secs),
        ..defaults
    }
}

fn security_config(raw: &RawEnv) -> SecurityConfig {
    SecurityConfig {
        // Secrets are taken verbatim; only an empty value counts as absent.
        secret: raw.jwt_secret.clone().filter(|s| !s.is_empty()),
        token_ttl_minutes: parsed(raw.token_exp_min.as_ref())
            .filter(|m| *m > 0)
            .unwrap_or(defaults::TOKEN_TTL_MINUTES),
        leeway_seconds: parsed(raw.jwt_leeway_seconds.as_ref())
            .unwrap_or(defaults::TOKEN_LEEWAY_SECONDS),
    }
}

fn database_config(raw: &RawEnv) -> Option<DatabaseConfig> {
    let url = present(raw.database_url.as_ref()).map(str::to_owned).or_else(|| {
        present(raw.database_host.as_ref()).map(|host| {
            let port = parsed(raw.database_port.as_ref()).unwrap_or(defaults::DATABASE_PORT);
            format!("ws://{host}:{port}")
        })
    })?;

    let mut db = DatabaseConfig::new(url);
    if let Some(ns) = present(raw.database_namespace.as_ref()) {
        ns.clone_into(&mut db.namespace);
    }
    if let Some(name) = present(raw.database_name.as_ref()) {
        name.clone_into(&mut db.database);
    }
    if let (Some(username), Some(password)) =
        (present(raw.database_user.as_ref()), raw.database_password.as_ref().filter(|p| !p.is_empty()))
    {
        db.credentials =
            Some(DatabaseCredentials { username: username.to_owned(), password: password.clone() });
    }
    if let Some(ms) = parsed::<u64>(raw.database_probe_timeout_ms.as_ref()).filter(|ms| *ms > 0) {
        db.probe_timeout = Duration::from_millis(ms);
    }
    if let Some(ms) = parsed::<u64>(raw.database_gate_ttl_ms.as_ref()) {
        db.availability_ttl = Duration::from_millis(ms);
    }
    Some(db)
}

fn logging_config(raw: &RawEnv) -> LoggingConfig {
    LoggingConfig {
        filter: present(raw.rust_log.as_ref()).map(str::to_owned),
        directory: present(raw.log_dir.as_ref()).map(PathBuf::from),
        json: present(raw.log_format.as_ref()).is_some_and(|f| f.eq_ignore_ascii_case("json")),
    }
}

/// Leading slash, no trailing slash. Empty, root or unmountable prefixes fall back to the
/// default.
fn normalize_prefix(prefix: Option<&str>) -> String {
    let trimmed = prefix.unwrap_or_default().trim_matches('/');
    if trimmed.is_empty() {
        return defaults::DOCS_PREFIX.to_owned();
    }

    let prefix = format!("/{trimmed}");
    match validate_path(&prefix) {
        Ok(()) if !prefix.contains(['{', '}']) => prefix,
        Ok(()) => {
            warn!(%prefix, fallback = defaults::DOCS_PREFIX, "Documentation prefix may not contain parameters");
            defaults::DOCS_PREFIX.to_owned()
        },
        Err(err) => {
            warn!(%prefix, fallback = defaults::DOCS_PREFIX, error = %err, "Invalid documentation prefix");
            defaults::DOCS_PREFIX.to_owned()
        },
    }
}
