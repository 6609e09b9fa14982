//! # Rollcall Server
//!
//! HTTP entry point of the attendance service, built on `Axum`, `SurrealDB` and a
//! typed live-event hub.
//!
//! Startup never waits for the database or a signing secret: routes that need
//! them answer 503 or 401 until they are available. The only fatal error is a
//! failure to bind the listener.
//!
//! ## Example
//! ```no_run
//! use rollcall_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(3001)
//!         .build()
//!         .run()
//!         .await
//! }
//! ```

mod router;

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::Request;
use axum::{Router, ServiceExt};
use axum_server::Handle;
use rollcall::domain::availability::DatabaseAvailability;
use rollcall::domain::config::AppConfig;
use rollcall::kernel::server::ApiState;
use rollcall::kernel::server::registrar::{RegistrationReport, RouteGroup};
use tokio::signal;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tracing::{error, info, warn};
use utoipa::openapi::OpenApi;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: AppConfig,
    groups: Option<Vec<RouteGroup<ApiState>>>,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: AppConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    /// Replaces the feature route groups (defaults to [`rollcall::route_groups`]).
    pub fn groups(mut self, groups: Vec<RouteGroup<ApiState>>) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Consumes the builder and assembles the application.
    ///
    /// # Process
    /// 1. Constructs application state (verifier, issuer, database gate, event hub)
    /// 2. Registers the health routes, then every feature group
    /// 3. Mounts the API documentation and the middleware stack
    ///
    /// Nothing here touches the network; the database is probed on first use.
    pub fn build(self) -> Server {
        let state = ApiState::from_config(self.cfg);
        let groups = self.groups.unwrap_or_else(rollcall::route_groups);

        let (router, report) = router::init(state.clone(), groups);
        for group in &report.groups {
            if !group.state.is_registered() {
                warn!(group = %group.group, state = %group.state, "Route group is not served");
            }
        }

        let app = NormalizePathLayer::trim_trailing_slash().layer(router);
        Server { state, app, report }
    }
}

/// A fully assembled server ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
    app: NormalizePath<Router>,
    report: RegistrationReport,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Binds `0.0.0.0:{port}` and serves until a shutdown signal arrives.
    ///
    /// # Errors
    /// Returns an error if the listener cannot be bound.
    pub async fn run(self) -> Result<()> {
        let server = &self.state.config.server;
        let address = SocketAddr::new(server.host, server.port);
        info!(address = %address, "Starting server");

        let gate = self.state.gate.clone();
        tokio::spawn(async move {
            match gate.check().await {
                DatabaseAvailability::Available => info!("Database is available"),
                DatabaseAvailability::Unavailable(reason) => {
                    warn!(reason = reason.code(), "Database is unavailable; persistence routes answer 503");
                },
            }
        });

        let handle = Handle::<SocketAddr>::new();

        let shutdown_handle = handle.clone();
        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        });

        let listening_handle = handle.clone();
        tokio::spawn(async move {
            if let Some(bound) = listening_handle.listening().await {
                info!("Listening on http://{bound}");
            }
        });

        axum_server::bind(address)
            .handle(handle)
            .serve(ServiceExt::<Request>::into_make_service(self.app))
            .await
            .with_context(|| format!("Failed to serve on {address}"))?;

        info!("Server shutdown complete");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }

    /// How each feature group was registered.
    #[must_use]
    pub const fn report(&self) -> &RegistrationReport {
        &self.report
    }

    /// The complete service, for driving requests without a listener.
    #[must_use]
    pub fn app(&self) -> NormalizePath<Router> {
        self.app.clone()
    }
}

/// The `OpenAPI` document the server would publish for `cfg` and `groups`.
#[must_use]
pub fn openapi(cfg: &AppConfig, groups: Vec<RouteGroup<ApiState>>) -> OpenApi {
    router::assemble(&cfg.server.docs_prefix, groups).openapi
}

/// Listens for shutdown signals (Ctrl+C, SIGTERM).
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res,
        res = terminate => res,
    }
}
