use std::borrow::Cow;
use std::fmt;

use axum::http::Method;
use axum::routing::MethodRouter;
use utoipa::openapi::path::Paths;
use utoipa::openapi::schema::Schema;
use utoipa::openapi::RefOr;
use utoipa_axum::router::UtoipaMethodRouter;

/// `OpenAPI` fragment produced by `utoipa_axum::routes!` for one handler.
#[derive(Debug, Clone, Default)]
pub struct RouteDoc {
    pub schemas: Vec<(String, RefOr<Schema>)>,
    pub paths: Paths,
}

/// One HTTP route: method, path, handler and, optionally, its documentation.
pub struct RouteDef<S> {
    pub method: Method,
    pub path: Cow<'static, str>,
    pub handler: MethodRouter<S>,
    pub doc: Option<RouteDoc>,
}

impl<S> RouteDef<S> {
    /// A route whose handler carries a `#[utoipa::path]` operation.
    ///
    /// ```rust,ignore
    /// RouteDef::documented(Method::GET, "/auth/me", routes!(handlers::me))
    /// ```
    pub fn documented(
        method: Method,
        path: impl Into<Cow<'static, str>>,
        (schemas, paths, handler): UtoipaMethodRouter<S>,
    ) -> Self {
        Self { method, path: path.into(), handler, doc: Some(RouteDoc { schemas, paths }) }
    }

    /// A route without documentation; it can only be registered directly.
    pub fn direct(method: Method, path: impl Into<Cow<'static, str>>, handler: MethodRouter<S>) -> Self {
        Self { method, path: path.into(), handler, doc: None }
    }
}

impl<S> fmt::Debug for RouteDef<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDef")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("documented", &self.doc.is_some())
            .finish_non_exhaustive()
    }
}

/// Routes owned by one feature, registered together or not at all.
pub struct RouteGroup<S> {
    name: Cow<'static, str>,
    routes: Vec<RouteDef<S>>,
}

impl<S> RouteGroup<S> {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self { name: name.into(), routes: Vec::new() }
    }

    #[must_use]
    pub fn route(mut self, route: RouteDef<S>) -> Self {
        self.routes.push(route);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn routes(&self) -> &[RouteDef<S>] {
        &self.routes
    }

    pub(super) fn into_parts(self) -> (Cow<'static, str>, Vec<RouteDef<S>>) {
        (self.name, self.routes)
    }
}

impl<S> fmt::Debug for RouteGroup<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup").field("name", &self.name).field("routes", &self.routes).finish()
    }
}
