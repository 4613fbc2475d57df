//! Protocol servers and the process-level union server.
//!
//! Each protocol server binds its listener on construction, serves in
//! [`Server::run`] and drains in [`Server::graceful_stop`].

use std::future::Future;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

mod gateway;
mod grpc;
mod http;
mod union;

pub use gateway::GatewayServer;
pub use grpc::GrpcServer;
pub use http::HttpServer;
pub use union::{SHUTDOWN_DEADLINE, UnionServer, shutdown_signal};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("http server error: {0}")]
    Http(#[source] io::Error),

    #[error("grpc server error: {0}")]
    Grpc(#[from] tonic::transport::Error),

    #[error("grpc reflection setup failed: {0}")]
    Reflection(#[from] tonic_reflection::server::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("server is already running")]
    AlreadyStarted,

    #[error("server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait Server: Send + Sync {
    /// Serve until stopped.
    async fn run(&self) -> Result<(), ServerError>;

    /// Stop accepting, wait up to `deadline` for in-flight requests, then
    /// force the server down.
    async fn graceful_stop(&self, deadline: Duration);
}

/// The protocol surface selected by `server-mode`.
pub enum ProtocolServer {
    Http(HttpServer),
    Grpc(GrpcServer),
    Gateway(GatewayServer),
}

#[async_trait]
impl Server for ProtocolServer {
    async fn run(&self) -> Result<(), ServerError> {
        match self {
            ProtocolServer::Http(server) => server.run().await,
            ProtocolServer::Grpc(server) => server.run().await,
            ProtocolServer::Gateway(server) => server.run().await,
        }
    }

    async fn graceful_stop(&self, deadline: Duration) {
        match self {
            ProtocolServer::Http(server) => server.graceful_stop(deadline).await,
            ProtocolServer::Grpc(server) => server.graceful_stop(deadline).await,
            ProtocolServer::Gateway(server) => server.graceful_stop(deadline).await,
        }
    }
}

async fn bind(addr: &str) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr).await.map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })
}

/// Address a local client should dial to reach a listener on `addr`.
pub(crate) fn dialable(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}

/// Shutdown bookkeeping shared by the listener-owning servers.
#[derive(Debug, Default)]
struct Lifecycle {
    shutdown: CancellationToken,
    force: CancellationToken,
    stopped: CancellationToken,
}

impl Lifecycle {
    /// Drive `serve` until it returns or the server is forced down.
    async fn serve<F, E>(&self, name: &'static str, serve: F) -> Result<(), E>
    where
        F: Future<Output = Result<(), E>>,
    {
        let result = tokio::select! {
            result = serve => result,
            _ = self.force.cancelled() => {
                tracing::warn!(server = name, "in-flight requests abandoned");
                Ok(())
            }
        };
        self.stopped.cancel();
        result
    }

    async fn stop(&self, name: &'static str, deadline: Duration) {
        self.shutdown.cancel();
        if tokio::time::timeout(deadline, self.stopped.cancelled()).await.is_err() {
            tracing::warn!(server = name, ?deadline, "graceful shutdown timed out, forcing close");
            self.force.cancel();
        }
    }

    async fn shutdown_requested(token: CancellationToken) {
        token.cancelled().await
    }
}
