use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;

use plumber_store::DocumentStore;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// The Plumber HTTP server.
pub struct PlumberServer {
    config: ServerConfig,
    state: AppState,
}

impl PlumberServer {
    /// Build a server over an already-constructed document store.
    pub fn new(config: ServerConfig, store: Arc<dyn DocumentStore>) -> Self {
        let state = AppState::new(config.stages, store);
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone(), self.config.max_body_bytes)
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        self.serve_on(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then drain in-flight
    /// requests.
    pub async fn serve_on<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = listener.local_addr()?;
        tracing::info!(
            "plumber listening on {addr} with {} stage(s)",
            self.config.stages
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        tracing::info!("plumber stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("cannot listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown requested");
}

#[cfg(test)]
mod tests {
    use super::*;
    use plumber_store::InMemoryDocumentStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn server(stages: u32) -> PlumberServer {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            stages,
            ..Default::default()
        };
        PlumberServer::new(config, Arc::new(InMemoryDocumentStore::new()))
    }

    #[test]
    fn server_construction() {
        let server = server(3);
        assert_eq!(server.config().stages, 3);
        let _router = server.router();
    }

    #[tokio::test]
    async fn serves_over_tcp_and_shuts_down() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, stopped) = tokio::sync::oneshot::channel::<()>();

        let task = tokio::spawn(server(1).serve_on(listener, async move {
            let _ = stopped.await;
        }));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /_healthcheck HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"), "{response}");

        stop.send(()).unwrap();
        task.await.unwrap().unwrap();
    }
}
