use crate::config::Config;
use crate::confirm::ConfirmationHandle;
use crate::error::Error;
use crate::pipeline::Pipeline;
use crate::providers::{AiCompletionProvider, EmailProvider, ModelCatalog};
use crate::server::{self, AppState};
use crate::shutdown;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Wire up the pipeline and serve the HTTP API until shutdown
pub async fn start_server(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    let (listen_addr, confirmation_ttl) = {
        let config_read = config.read().await;
        (
            config_read.listen_addr.clone(),
            Duration::from_secs(config_read.confirmation_ttl_secs),
        )
    };

    let confirmations = ConfirmationHandle::spawn(confirmation_ttl);

    let pipeline = Pipeline::new(
        Arc::clone(&config),
        Arc::new(AiCompletionProvider::new(Arc::clone(&config))),
        Arc::new(EmailProvider::new(Arc::clone(&config))),
        confirmations.clone(),
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
        catalog: Arc::new(ModelCatalog::new(Arc::clone(&config))),
    };

    let (shutdown_send, shutdown_recv) = oneshot::channel();
    tokio::spawn(shutdown::handle_signals(shutdown_send, confirmations));

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .map_err(Error::Io)?;
    info!("Listening on {}", listen_addr);

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(async {
            let _ = shutdown_recv.await;
        })
        .await
        .map_err(Error::Io)?;

    info!("Server stopped");
    Ok(())
}
