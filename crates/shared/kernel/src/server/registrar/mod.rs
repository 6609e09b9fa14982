//! # Route Registrar
//!
//! Registers feature route groups on the application router. Each group first
//! goes through the documented mechanism (`utoipa_axum::OpenApiRouter`), which
//! requires every route to carry an `OpenAPI` operation matching its method and
//! path. A group that does not fit is registered directly on the router instead,
//! without documentation. A group whose routes the router would reject (bad
//! syntax, overlaps) is not registered at all; the rest of the application is
//! unaffected.
//!
//! ```text
//! Unattempted -> StructuredAttempt -> StructuredOk
//!                        |
//!                        +-> FallbackAttempt -> FallbackOk
//!                        |
//!                        +-> RegistrationFailed
//! ```

mod outcome;
mod route;

pub use outcome::{
    GroupRegistration, Mechanism, RegistrarError, RegistrarErrorExt, RegistrationOutcome,
    RegistrationReport, RegistrationState,
};
pub use route::{RouteDef, RouteDoc, RouteGroup};

use std::borrow::Cow;

use axum::Router;
use axum::http::Method;
use axum::routing::MethodRouter;
use fxhash::{FxHashMap, FxHashSet};
use tracing::{debug, error, info, warn};
use utoipa::openapi::OpenApi;
use utoipa::openapi::path::{Operation, PathItem};
use utoipa_axum::router::OpenApiRouter;

/// Router, documentation and report produced by a registrar run.
#[derive(Debug)]
pub struct RegisteredRoutes<S> {
    pub router: Router<S>,
    pub openapi: OpenApi,
    pub report: RegistrationReport,
}

/// Runs the registration state machine for each group, in order.
pub struct RouteRegistrar<S> {
    openapi: OpenApi,
    structured: Vec<(RouteDoc, MethodRouter<S>)>,
    direct: Vec<(Cow<'static, str>, MethodRouter<S>)>,
    /// `(method, path)` pairs already taken.
    claimed: FxHashSet<(Method, String)>,
    /// Parameter-agnostic path shape to the literal path that introduced it.
    shapes: FxHashMap<String, String>,
    report: RegistrationReport,
}

impl<S> RouteRegistrar<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Starts from `openapi`, which receives the documentation of structured groups.
    #[must_use]
    pub fn new(openapi: OpenApi) -> Self {
        Self {
            openapi,
            structured: Vec::new(),
            direct: Vec::new(),
            claimed: FxHashSet::default(),
            shapes: FxHashMap::default(),
            report: RegistrationReport::default(),
        }
    }

    /// Marks a route served elsewhere so no group can shadow it.
    pub fn reserve(&mut self, method: Method, path: impl Into<String>) {
        let path = path.into();
        self.shapes.entry(shape_of(&path)).or_insert_with(|| path.clone());
        self.claimed.insert((method, path));
    }

    #[must_use]
    pub fn is_claimed(&self, method: &Method, path: &str) -> bool {
        self.claimed.contains(&(method.clone(), path.to_owned()))
    }

    /// Registers one group and returns the state it ended in.
    pub fn register(&mut self, group: RouteGroup<S>) -> RegistrationState {
        let (name, routes) = group.into_parts();
        let mut entry = GroupRegistration {
            group: name.clone(),
            state: RegistrationState::Unattempted,
            transitions: vec![RegistrationState::Unattempted],
            outcomes: Vec::new(),
            routes: routes.iter().map(|r| (r.method.clone(), r.path.to_string())).collect(),
        };

        info!(group = %name, routes = routes.len(), "Registering route group");
        advance(&mut entry, RegistrationState::StructuredAttempt);

        if let Err(err) = self.preflight(&routes) {
            error!(group = %name, error = %err, "Route group rejected; its routes will not be served");
            entry.outcomes.push(RegistrationOutcome::Fatal(err));
            advance(&mut entry, RegistrationState::RegistrationFailed);
            return self.record(entry);
        }

        match structured_fit(&routes) {
            Ok(()) => {
                self.claim(&routes);
                self.structured.extend(
                    routes.into_iter().map(|route| (route.doc.unwrap_or_default(), route.handler)),
                );
                entry.outcomes.push(RegistrationOutcome::Registered(Mechanism::Structured));
                advance(&mut entry, RegistrationState::StructuredOk);
            },
            Err(reason) => {
                warn!(group = %name, %reason, "Structured registration incompatible; falling back");
                entry.outcomes.push(RegistrationOutcome::Incompatible(reason));
                advance(&mut entry, RegistrationState::FallbackAttempt);

                self.claim(&routes);
                self.direct.extend(routes.into_iter().map(|route| (route.path, route.handler)));
                entry.outcomes.push(RegistrationOutcome::Registered(Mechanism::Fallback));
                advance(&mut entry, RegistrationState::FallbackOk);
            },
        }

        self.record(entry)
    }

    /// Registers every group, in order.
    pub fn register_all(&mut self, groups: impl IntoIterator<Item = RouteGroup<S>>) {
        for group in groups {
            self.register(group);
        }
    }

    pub fn report(&self) -> &RegistrationReport {
        &self.report
    }

    #[must_use]
    pub fn finish(self) -> RegisteredRoutes<S> {
        let router = self
            .structured
            .into_iter()
            .fold(OpenApiRouter::with_openapi(self.openapi), |router, (doc, handler)| {
                router.routes((doc.schemas, doc.paths, handler))
            });
        let router =
            self.direct.into_iter().fold(router, |router, (path, handler)| router.route(&path, handler));
        let (router, openapi) = router.split_for_parts();

        info!(
            structured = self.report.count(RegistrationState::StructuredOk),
            fallback = self.report.count(RegistrationState::FallbackOk),
            failed = self.report.count(RegistrationState::RegistrationFailed),
            "Route registration finished"
        );
        RegisteredRoutes { router, openapi, report: self.report }
    }

    fn record(&mut self, entry: GroupRegistration) -> RegistrationState {
        let state = entry.state;
        self.report.groups.push(entry);
        state
    }

    fn claim(&mut self, routes: &[RouteDef<S>]) {
        for route in routes {
            self.reserve(route.method.clone(), route.path.to_string());
        }
    }

    /// Checks that apply to both mechanisms: anything failing here would make
    /// the router panic.
    fn preflight(&self, routes: &[RouteDef<S>]) -> Result<(), RegistrarError> {
        let mut seen: FxHashSet<(&Method, &str)> = FxHashSet::default();
        let mut shapes: FxHashMap<String, &str> = FxHashMap::default();

        for route in routes {
            let path = route.path.as_ref();
            validate_path(path)?;

            if !seen.insert((&route.method, path)) {
                return Err(RegistrarError::Conflict {
                    message: format!("{} {path} is declared twice", route.method).into(),
                    context: None,
                });
            }
            if self.claimed.contains(&(route.method.clone(), path.to_owned())) {
                return Err(RegistrarError::Conflict {
                    message: format!("{} {path} is already registered", route.method).into(),
                    context: None,
                });
            }

            let shape = shape_of(path);
            let existing = self.shapes.get(&shape).map(String::as_str).or_else(|| shapes.get(&shape).copied());
            if let Some(existing) = existing.filter(|existing| *existing != path) {
                return Err(RegistrarError::Conflict {
                    message: format!("{path} overlaps {existing}").into(),
                    context: Some("Paths differ only in parameter names".into()),
                });
            }
            shapes.entry(shape).or_insert(path);
        }

        Ok(())
    }
}

impl<S> std::fmt::Debug for RouteRegistrar<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteRegistrar")
            .field("structured", &self.structured.len())
            .field("direct", &self.direct.len())
            .field("claimed", &self.claimed.len())
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

fn advance(entry: &mut GroupRegistration, next: RegistrationState) {
    debug!(group = %entry.group, from = %entry.state, to = %next, "Registration state changed");
    entry.state = next;
    entry.transitions.push(next);
}

/// Whether every route can go through the documented mechanism.
fn structured_fit<S>(routes: &[RouteDef<S>]) -> Result<(), Cow<'static, str>> {
    for route in routes {
        let label = format!("{} {}", route.method, route.path);

        let Some(doc) = &route.doc else {
            return Err(format!("{label} has no OpenAPI operation").into());
        };

        let documented: Vec<&String> = doc.paths.paths.keys().collect();
        if documented.len() != 1 || documented[0] != route.path.as_ref() {
            return Err(format!("{label} is documented under {documented:?}").into());
        }

        let operation = doc
            .paths
            .paths
            .get(route.path.as_ref())
            .and_then(|item| operation_for(item, &route.method))
            .ok_or_else(|| format!("{label} is documented for a different method"))?;

        if operation.responses.responses.is_empty() {
            return Err(format!("{label} documents no responses").into());
        }
    }

    Ok(())
}

fn operation_for<'a>(item: &'a PathItem, method: &Method) -> Option<&'a Operation> {
    let operation = match *method {
        Method::GET => &item.get,
        Method::POST => &item.post,
        Method::PUT => &item.put,
        Method::PATCH => &item.patch,
        Method::DELETE => &item.delete,
        Method::HEAD => &item.head,
        Method::OPTIONS => &item.options,
        Method::TRACE => &item.trace,
        _ => return None,
    };
    operation.as_ref()
}

/// Router path syntax: `/segment/{param}/{*rest}`.
///
/// # Errors
/// [`RegistrarError::InvalidPath`] for anything the router would refuse to mount.
pub fn validate_path(path: &str) -> Result<(), RegistrarError> {
    let invalid = |reason: &str| RegistrarError::InvalidPath {
        message: format!("{path}: {reason}").into(),
        context: None,
    };

    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    let segments: Vec<&str> = path.split('/').skip(1).collect();
    for (index, segment) in segments.iter().enumerate() {
        if segment.starts_with(':') || segment.starts_with('*') {
            return Err(invalid("legacy ':param' or '*wildcard' segment; use '{param}'"));
        }
        if !segment.contains(['{', '}']) {
            continue;
        }

        let name = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .ok_or_else(|| invalid("parameters must span a whole segment"))?;
        let (catch_all, name) = match name.strip_prefix('*') {
            Some(rest) => (true, rest),
            None => (false, name),
        };

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("parameter names must be non-empty identifiers"));
        }
        if catch_all && index + 1 != segments.len() {
            return Err(invalid("a catch-all parameter must be the last segment"));
        }
    }

    Ok(())
}

/// `/classes/{id}` and `/classes/{class_id}` share the shape `/classes/{}`.
fn shape_of(path: &str) -> String {
    path.split('/')
        .map(|segment| if segment.starts_with('{') { "{}" } else { segment })
        .collect::<Vec<_>>()
        .join("/")
}
