//! HTTP Server
//!
//! Binds the listener up front (so the bound address is known before serving)
//! and stops accepting connections once the shutdown token fires.

use crate::handler::AppState;
use crate::router::build_router;
use axum::Router;
use ingestq_core::application::ShutdownToken;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 5000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

impl HttpServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// HTTP Server
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
}

impl HttpServer {
    pub async fn bind(config: &HttpServerConfig, state: AppState) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.addr()).await?;
        info!(addr = %listener.local_addr()?, "HTTP server listening");

        Ok(Self {
            listener,
            router: build_router(state),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until shutdown, then drain in-flight requests
    pub async fn run(self, mut shutdown: ShutdownToken) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.wait().await;
                info!("HTTP server shutting down");
            })
            .await
    }
}
