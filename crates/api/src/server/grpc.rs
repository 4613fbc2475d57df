use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server as TonicServer;
use tonic_health::server::{HealthReporter, health_reporter};

use crate::grpc::{FastBlogService, interceptor};
use crate::pb::FILE_DESCRIPTOR_SET;
use crate::pb::v1::fast_blog_server::FastBlogServer;

use super::{Lifecycle, Server, ServerError, bind};

/// gRPC listener with health checking and server reflection.
pub struct GrpcServer {
    listener: Mutex<Option<TcpListener>>,
    local_addr: SocketAddr,
    service: FastBlogService,
    timeout: Duration,
    health: Mutex<Option<HealthReporter>>,
    lifecycle: Lifecycle,
}

impl GrpcServer {
    pub async fn bind(addr: &str, service: FastBlogService, timeout: Duration) -> Result<Self, ServerError> {
        let listener = bind(addr).await?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        Ok(Self {
            listener: Mutex::new(Some(listener)),
            local_addr,
            service,
            timeout,
            health: Mutex::new(None),
            lifecycle: Lifecycle::default(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[async_trait]
impl Server for GrpcServer {
    async fn run(&self) -> Result<(), ServerError> {
        let listener = self.listener.lock().await.take().ok_or(ServerError::AlreadyStarted)?;

        let (mut reporter, health_service) = health_reporter();
        reporter.set_serving::<FastBlogServer<FastBlogService>>().await;
        *self.health.lock().await = Some(reporter);

        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .register_encoded_file_descriptor_set(tonic_health::pb::FILE_DESCRIPTOR_SET)
            .build_v1()?;

        tracing::info!(addr = %self.local_addr, "grpc server listening");

        let shutdown = self.lifecycle.shutdown.clone();
        let serve = TonicServer::builder()
            .timeout(self.timeout)
            .add_service(health_service)
            .add_service(reflection)
            .add_service(FastBlogServer::with_interceptor(self.service.clone(), interceptor::request_id))
            .serve_with_incoming_shutdown(
                TcpListenerStream::new(listener),
                Lifecycle::shutdown_requested(shutdown),
            );

        self.lifecycle.serve("grpc", serve).await.map_err(ServerError::Grpc)
    }

    async fn graceful_stop(&self, deadline: Duration) {
        if let Some(reporter) = self.health.lock().await.as_mut() {
            reporter.set_not_serving::<FastBlogServer<FastBlogService>>().await;
        }
        self.lifecycle.stop("grpc", deadline).await;
        tracing::info!(addr = %self.local_addr, "grpc server stopped");
    }
}
