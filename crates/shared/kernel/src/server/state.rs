use std::borrow::Cow;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::FromRef;
use rollcall_domain::config::AppConfig;
use rollcall_domain::events::LiveEvent;
use rollcall_events::EventHub;

use super::gate::DatabaseGate;
use crate::security::{AuthVerifier, TokenIssuer};

#[rollcall_derive::service_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

#[derive(Debug)]
pub struct ApiStateInner {
    pub config: AppConfig,
    pub verifier: AuthVerifier,
    pub issuer: TokenIssuer,
    pub gate: DatabaseGate,
    pub events: EventHub<LiveEvent>,
}

/// Shared, read-only handles passed to every handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    /// State derived entirely from `config`.
    #[must_use]
    pub fn from_config(config: AppConfig) -> Self {
        let inner = ApiStateBuilder::parts(config, None, None);
        Self { inner: Arc::new(inner) }
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for AppConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for AuthVerifier {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.verifier.clone()
    }
}

impl FromRef<ApiState> for TokenIssuer {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.issuer.clone()
    }
}

impl FromRef<ApiState> for DatabaseGate {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.gate.clone()
    }
}

impl FromRef<ApiState> for EventHub<LiveEvent> {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.events.clone()
    }
}

/// Builds an [`ApiState`]; anything not supplied is derived from the config.
#[derive(Debug, Default)]
pub struct ApiStateBuilder {
    config: Option<AppConfig>,
    gate: Option<DatabaseGate>,
    events: Option<EventHub<LiveEvent>>,
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the gate built from `config.database`.
    #[must_use]
    pub fn gate(mut self, gate: DatabaseGate) -> Self {
        self.gate = Some(gate);
        self
    }

    #[must_use]
    pub fn events(mut self, events: EventHub<LiveEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// # Errors
    /// [`ApiStateError::Validation`] if no configuration was provided.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "AppConfig not provided".into(),
            context: None,
        })?;

        Ok(ApiState { inner: Arc::new(Self::parts(config, self.gate, self.events)) })
    }

    fn parts(
        config: AppConfig,
        gate: Option<DatabaseGate>,
        events: Option<EventHub<LiveEvent>>,
    ) -> ApiStateInner {
        ApiStateInner {
            verifier: AuthVerifier::new(&config.security),
            issuer: TokenIssuer::new(&config.security),
            gate: gate.unwrap_or_else(|| DatabaseGate::new(config.database.clone())),
            events: events.unwrap_or_default(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use rollcall_domain::config::AppConfigInner;

    use super::*;

    #[test]
    fn config_is_required() {
        let err = ApiState::builder().build().unwrap_err();
        assert!(matches!(err, ApiStateError::Validation { .. }));
    }

    #[test]
    fn parts_follow_the_config() {
        let mut inner = AppConfigInner::default();
        inner.security.secret = Some("test-secret".to_owned());
        let state = ApiState::builder().config(AppConfig::new(inner)).build().unwrap();

        assert!(state.verifier.is_configured());
        assert!(state.issuer.is_configured());
        assert!(!state.gate.is_configured());
    }
}
