use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use super::{Lifecycle, Server, ServerError, bind};

/// Plain HTTP listener serving an axum router.
pub struct HttpServer {
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    router: Router,
    lifecycle: Lifecycle,
}

impl HttpServer {
    /// Bind `addr` for `router`, which already carries its middleware stack.
    pub async fn bind(addr: &str, router: Router) -> Result<Self, ServerError> {
        let listener = bind(addr).await?;
        let local_addr = listener.local_addr().map_err(ServerError::Http)?;

        Ok(Self {
            listener: Mutex::new(Some(listener)),
            local_addr,
            router,
            lifecycle: Lifecycle::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl Server for HttpServer {
    async fn run(&self) -> Result<(), ServerError> {
        let listener = self.listener.lock().await.take().ok_or(ServerError::AlreadyStarted)?;
        tracing::info!(addr = %self.local_addr, "http server listening");

        let shutdown = self.lifecycle.shutdown.clone();
        let serve = axum::serve(listener, self.router.clone().into_make_service())
            .with_graceful_shutdown(Lifecycle::shutdown_requested(shutdown));

        self.lifecycle
            .serve("http", async move { serve.await })
            .await
            .map_err(ServerError::Http)
    }

    async fn graceful_stop(&self, deadline: Duration) {
        self.lifecycle.stop("http", deadline).await;
        tracing::info!(addr = %self.local_addr, "http server stopped");
    }
}
