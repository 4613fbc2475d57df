use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::config::{GrpcOptions, HttpOptions};
use crate::gateway::{build_gateway, connect};
use crate::grpc::FastBlogService;

use super::{GrpcServer, HttpServer, Server, ServerError, dialable};

/// gRPC listener plus an HTTP front that forwards to it.
pub struct GatewayServer {
    grpc: GrpcServer,
    http: HttpServer,
}

impl GatewayServer {
    pub async fn bind(http: &HttpOptions, grpc: &GrpcOptions, service: FastBlogService) -> Result<Self, ServerError> {
        let grpc = GrpcServer::bind(&grpc.addr, service, grpc.timeout).await?;
        let client = connect(dialable(grpc.local_addr()))?;
        let http = HttpServer::bind(&http.addr, build_gateway(client, http.timeout)).await?;

        Ok(Self { grpc, http })
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http.local_addr()
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        self.grpc.local_addr()
    }
}

#[async_trait]
impl Server for GatewayServer {
    async fn run(&self) -> Result<(), ServerError> {
        tokio::try_join!(self.grpc.run(), self.http.run())?;
        Ok(())
    }

    /// HTTP drains first so no forwarded call loses its upstream; both share
    /// the one deadline.
    async fn graceful_stop(&self, deadline: Duration) {
        let started = Instant::now();
        self.http.graceful_stop(deadline).await;
        self.grpc
            .graceful_stop(deadline.saturating_sub(started.elapsed()))
            .await;
    }
}
