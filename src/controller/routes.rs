use std::time::Duration;

use axum::{routing::MethodRouter, Router as AXRouter};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::app::AppContext;

/// A group of handlers sharing a prefix.
#[derive(Clone, Default, Debug)]
pub struct Routes {
    pub prefix: Option<String>,
    pub handlers: Vec<Handler>,
}

#[derive(Clone, Debug)]
pub struct Handler {
    pub uri: String,
    pub method: MethodRouter<AppContext>,
}

impl Routes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for the routes. this prefix will be a prefix for all the
    /// routes.
    #[must_use]
    pub fn prefix(mut self, uri: &str) -> Self {
        self.prefix = Some(uri.to_owned());
        self
    }

    /// Add a new handler.
    ///
    /// ```
    /// use axum::routing::get;
    /// use rdfs_studio::controller::Routes;
    ///
    /// async fn ping() -> &'static str {
    ///     "pong"
    /// }
    /// Routes::new().add("/_ping", get(ping));
    /// ```
    #[must_use]
    pub fn add(mut self, uri: &str, method: MethodRouter<AppContext>) -> Self {
        self.handlers.push(Handler {
            uri: uri.to_owned(),
            method,
        });
        self
    }

    /// Full uris of every handler.
    #[must_use]
    pub fn uris(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|handler| {
                format!(
                    "{}{}",
                    self.prefix.as_deref().unwrap_or_default(),
                    handler.uri
                )
            })
            .collect()
    }
}

/// All route groups of the application.
#[derive(Clone, Default, Debug)]
pub struct AppRoutes {
    routes: Vec<Routes>,
}

impl AppRoutes {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_route(mut self, routes: Routes) -> Self {
        self.routes.push(routes);
        self
    }

    #[must_use]
    pub fn collect(&self) -> Vec<String> {
        self.routes.iter().flat_map(Routes::uris).collect()
    }

    /// Builds the axum router with tracing, panic recovery and CORS layers.
    pub fn to_router(&self, ctx: AppContext) -> AXRouter {
        let mut app = AXRouter::new();
        for routes in &self.routes {
            for handler in &routes.handlers {
                let uri = format!(
                    "{}{}",
                    routes.prefix.as_deref().unwrap_or_default(),
                    handler.uri
                );
                tracing::debug!(uri, "registering route");
                app = app.route(&uri, handler.method.clone());
            }
        }

        app.layer(CorsLayer::permissive().max_age(Duration::from_secs(3600)))
            .layer(CatchPanicLayer::new())
            .layer(TraceLayer::new_for_http())
            .with_state(ctx)
    }
}
