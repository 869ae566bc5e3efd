//! Builds the application context and router, and runs the server.

use axum::Router;
use colored::Colorize;
use tokio::{net::TcpListener, signal};

use crate::{
    app::AppContext, config::Config, controller, environment::Environment, logger, Result,
};

/// Options for serving the application.
#[derive(Debug, Clone)]
pub struct ServeParams {
    pub port: i32,
    pub binding: String,
}

impl ServeParams {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            port: config.server.port,
            binding: config.server.binding.clone(),
        }
    }
}

/// Loads the configuration of `environment`, installs the logger and builds
/// the context.
///
/// # Errors
///
/// Fails when the configuration cannot be loaded or the logger cannot be
/// installed.
pub fn load(environment: &Environment) -> Result<AppContext> {
    let config = environment.load()?;
    logger::init(&config.logger)?;
    create_context(environment, config)
}

/// Creates the application context from an already loaded configuration.
///
/// # Errors
///
/// Fails when a preset named in the configuration does not exist or a
/// namespace of the configured header is not an absolute IRI.
pub fn create_context(environment: &Environment, config: Config) -> Result<AppContext> {
    for preset in &config.editor.presets {
        if crate::ontology::presets::find(preset).is_none() {
            return Err(crate::Error::Message(format!(
                "unknown preset `{preset}` in editor configuration"
            )));
        }
    }
    config.editor.header.validate()?;
    Ok(AppContext::new(environment.clone(), config))
}

/// Builds the router of every application route.
#[must_use]
pub fn create_router(ctx: &AppContext) -> Router {
    controller::routes(ctx).to_router(ctx.clone())
}

/// Serves the application until ctrl-c or SIGTERM.
///
/// # Errors
///
/// Fails when the address cannot be bound.
pub async fn start(ctx: AppContext, params: ServeParams) -> Result<()> {
    let router = create_router(&ctx);
    let address = format!("{}:{}", params.binding, params.port);
    let listener = TcpListener::bind(&address).await?;

    println!(
        "{} {} ({})",
        "listening on".green(),
        format!("http://{address}").bold(),
        ctx.environment.to_string().yellow()
    );
    tracing::info!(address, environment = %ctx.environment, "server started");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(err.msg = %err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => tracing::error!(err.msg = %err, "failed to install signal handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::create_context;
    use crate::{environment::Environment, tests_cfg::config::test_config};

    #[test]
    fn rejects_invalid_editor_settings() {
        assert!(create_context(&Environment::Test, test_config()).is_ok());

        let mut config = test_config();
        config.editor.presets = vec!["dublin".to_string()];
        let err = create_context(&Environment::Test, config).expect_err("unknown preset");
        assert!(err.to_string().contains("dublin"));

        let mut config = test_config();
        config.editor.header.instance_namespace = "inst space".to_string();
        let err = create_context(&Environment::Test, config).expect_err("invalid namespace");
        assert!(matches!(err, crate::Error::Iri(_)), "{err:?}");
    }
}
