use axum::{
    Router,
    routing::{get, post, put},
};

pub mod post;
pub mod system;
pub mod user;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/login", post(user::login))
        .route("/v1/users", post(user::create_user))
}

/// Endpoints that require an authenticated caller.
pub fn protected_router() -> Router {
    Router::new()
        .route("/refresh-token", post(user::refresh_token))
        .route("/v1/users", get(user::list_users))
        .route(
            "/v1/users/:user_id",
            get(user::get_user).put(user::update_user).delete(user::delete_user),
        )
        .route("/v1/users/:user_id/change-password", put(user::change_password))
        .route(
            "/v1/posts",
            post(post::create_post).get(post::list_posts).delete(post::delete_posts),
        )
        .route("/v1/posts/:post_id", get(post::get_post).put(post::update_post))
}
