//! JSON/HTTP → gRPC translation for `grpc-gateway` mode.
//!
//! Every route binds its JSON/query/path input the same way the REST router
//! does, then forwards it to the local gRPC listener. Credentials are checked
//! by the gRPC service, not here.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    Router,
    routing::{get, post, put},
};
use tonic::transport::{Channel, Endpoint};

use crate::app::{routes::system::not_found, with_common_layers};
use crate::pb::v1::fast_blog_client::FastBlogClient;

mod handlers;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lazily connected client for the gRPC listener at `addr`.
pub fn connect(addr: SocketAddr) -> Result<FastBlogClient<Channel>, tonic::transport::Error> {
    let channel = Endpoint::from_shared(format!("http://{addr}"))?
        .connect_timeout(CONNECT_TIMEOUT)
        .connect_lazy();
    Ok(FastBlogClient::new(channel))
}

pub fn build_gateway(client: FastBlogClient<Channel>, timeout: Duration) -> Router {
    let router = Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/login", post(handlers::login))
        .route("/refresh-token", post(handlers::refresh_token))
        .route("/v1/users", post(handlers::create_user).get(handlers::list_users))
        .route(
            "/v1/users/:user_id",
            get(handlers::get_user).put(handlers::update_user).delete(handlers::delete_user),
        )
        .route("/v1/users/:user_id/change-password", put(handlers::change_password))
        .route(
            "/v1/posts",
            post(handlers::create_post).get(handlers::list_posts).delete(handlers::delete_posts),
        )
        .route("/v1/posts/:post_id", get(handlers::get_post).put(handlers::update_post))
        .fallback(not_found)
        .layer(axum::Extension(client));

    with_common_layers(router, timeout)
}
