use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use fastblog_auth::TokenManager;
use fastblog_store::Store;

use crate::app::build_app;
use crate::biz::Biz;
use crate::config::{ServerMode, ServerOptions};
use crate::grpc::FastBlogService;

use super::{GatewayServer, GrpcServer, HttpServer, ProtocolServer, Server, ServerError};

/// Time allowed for in-flight requests once a stop signal arrives.
pub const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// Runs the configured protocol server until SIGINT/SIGTERM.
pub struct UnionServer {
    server: Arc<ProtocolServer>,
}

impl UnionServer {
    /// Connect the database and build every dependency from `opts`.
    pub async fn new(opts: &ServerOptions) -> Result<Self, ServerError> {
        let pool = opts.mysql.new_pool().await?;
        let tokens = Arc::new(TokenManager::new(&opts.jwt_key, opts.expiration));
        let biz = Biz::new(Store::new(pool), Arc::clone(&tokens));

        Self::with_deps(opts, biz, tokens).await
    }

    pub async fn with_deps(opts: &ServerOptions, biz: Biz, tokens: Arc<TokenManager>) -> Result<Self, ServerError> {
        let server = match opts.server_mode {
            ServerMode::Http => {
                let router = build_app(biz, tokens, opts.http.timeout);
                ProtocolServer::Http(HttpServer::bind(&opts.http.addr, router).await?)
            }
            ServerMode::Grpc => {
                let service = FastBlogService::new(biz, tokens);
                ProtocolServer::Grpc(GrpcServer::bind(&opts.grpc.addr, service, opts.grpc.timeout).await?)
            }
            ServerMode::GrpcGateway => {
                let service = FastBlogService::new(biz, tokens);
                ProtocolServer::Gateway(GatewayServer::bind(&opts.http, &opts.grpc, service).await?)
            }
        };
        tracing::info!(mode = ?opts.server_mode, "server initialized");

        Ok(Self {
            server: Arc::new(server),
        })
    }

    pub fn server(&self) -> &ProtocolServer {
        &self.server
    }

    pub async fn run(self) -> Result<(), ServerError> {
        self.run_until(shutdown_signal()).await
    }

    /// Serve on a background task until `signal` resolves, then stop within
    /// [`SHUTDOWN_DEADLINE`].
    pub async fn run_until<F>(self, signal: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()>,
    {
        let server = Arc::clone(&self.server);
        let mut task = tokio::spawn(async move { server.run().await });

        tokio::select! {
            // The server ended on its own, which only happens on failure.
            result = &mut task => return result?,
            _ = signal => {}
        }

        tracing::info!("shutting down server ...");
        self.server.graceful_stop(SHUTDOWN_DEADLINE).await;

        let result = task.await?;
        tracing::info!("server exited");
        result
    }
}

/// Resolves on SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
}
