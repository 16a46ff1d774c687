use crate::{
    config::Config,
    model_service::ModelState,
    ort_service::OrtModelService,
    server::HttpServer,
};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    // A failed load keeps the server up in degraded mode: the endpoint
    // answers with an explicit "model not loaded" error instead of the
    // process refusing to start.
    let model_state = match OrtModelService::new(&config.model) {
        Ok(service) => {
            tracing::info!(
                "Model loaded successfully from {:?}",
                config.model.get_model_path()
            );
            ModelState::Ready(Arc::new(service))
        }
        Err(e) => {
            tracing::error!(
                "Error loading model from {:?}: {}",
                config.model.get_model_path(),
                e
            );
            ModelState::Unavailable(e.to_string())
        }
    };

    let server = HttpServer::new(Arc::new(model_state), &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_handle = server.run(shutdown_tx.subscribe()).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    let _ = server_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
