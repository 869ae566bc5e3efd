//! Application state shared by every handler.

use std::sync::Arc;

use crate::{collab::Hub, config::Config, environment::Environment};

/// Represents the application context for a web server.
///
/// Handlers receive it through `State<AppContext>`; cloning is cheap.
#[derive(Clone, Debug)]
pub struct AppContext {
    /// The environment in which the application is running.
    pub environment: Environment,
    /// Configuration settings for the application
    pub config: Config,
    /// Every open collaboration session.
    pub hub: Arc<Hub>,
}

impl AppContext {
    #[must_use]
    pub fn new(environment: Environment, config: Config) -> Self {
        let hub = Hub::new(config.server.full_url(), config.editor.clone());
        Self {
            environment,
            config,
            hub: Arc::new(hub),
        }
    }
}
