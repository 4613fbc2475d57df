use std::future::Future;

use axum::{
    extract::{
        Extension, Json, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tonic::metadata::MetadataValue;
use tonic::transport::Channel;

use fastblog_core::Errorx;

use crate::app::errors::error_response;
use crate::context::{ContextExtractor, X_REQUEST_ID};
use crate::grpc::from_status;
use crate::pb::v1::fast_blog_client::FastBlogClient;
use crate::pb::v1::*;
use crate::pipeline::{bind_json, bind_path, bind_query};

type Client = FastBlogClient<Channel>;

fn grpc_request<T>(headers: &HeaderMap, request_id: &str, message: T) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    let metadata = request.metadata_mut();

    if let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| MetadataValue::try_from(v).ok())
    {
        metadata.insert("authorization", value);
    }
    if let Ok(value) = MetadataValue::try_from(request_id) {
        metadata.insert(X_REQUEST_ID, value);
    }
    request
}

/// Send one bound message and render the reply (or the rebuilt envelope).
async fn forward<T, R, F, Fut>(ctx: ContextExtractor, headers: HeaderMap, bound: Result<T, Errorx>, call: F) -> Response
where
    R: Serialize,
    F: FnOnce(tonic::Request<T>) -> Fut,
    Fut: Future<Output = Result<tonic::Response<R>, tonic::Status>>,
{
    let ContextExtractor(ctx) = ctx;
    let message = match bound {
        Ok(message) => message,
        Err(err) => return error_response(&err),
    };

    match call(grpc_request(&headers, ctx.request_id(), message)).await {
        Ok(resp) => (StatusCode::OK, Json(resp.into_inner())).into_response(),
        Err(status) => {
            let err = from_status(&status);
            if err.code() >= 500 {
                tracing::error!(request_id = ctx.request_id(), code = ?status.code(), "upstream rpc failed");
            }
            error_response(&err)
        }
    }
}

pub async fn healthz(Extension(mut client): Extension<Client>, ctx: ContextExtractor, headers: HeaderMap) -> Response {
    forward(ctx, headers, Ok(HealthzRequest {}), |rq| async move { client.healthz(rq).await }).await
}

pub async fn login(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    forward(ctx, headers, bind_json(payload), |rq| async move { client.login(rq).await }).await
}

pub async fn refresh_token(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
) -> Response {
    forward(ctx, headers, Ok(RefreshTokenRequest {}), |rq| async move {
        client.refresh_token(rq).await
    })
    .await
}

pub async fn change_password(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let bound = bind_path(path).and_then(|user_id| {
        bind_json(payload).map(|rq| ChangePasswordRequest { user_id, ..rq })
    });
    forward(ctx, headers, bound, |rq| async move { client.change_password(rq).await }).await
}

pub async fn create_user(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    forward(ctx, headers, bind_json(payload), |rq| async move { client.create_user(rq).await }).await
}

pub async fn update_user(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Response {
    let bound = bind_path(path).and_then(|user_id| {
        bind_json(payload).map(|rq| UpdateUserRequest { user_id, ..rq })
    });
    forward(ctx, headers, bound, |rq| async move { client.update_user(rq).await }).await
}

pub async fn delete_user(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let bound = bind_path(path).map(|user_id| DeleteUserRequest { user_id });
    forward(ctx, headers, bound, |rq| async move { client.delete_user(rq).await }).await
}

pub async fn get_user(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let bound = bind_path(path).map(|user_id| GetUserRequest { user_id });
    forward(ctx, headers, bound, |rq| async move { client.get_user(rq).await }).await
}

pub async fn list_users(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    query: Result<Query<ListUserRequest>, QueryRejection>,
) -> Response {
    forward(ctx, headers, bind_query(query), |rq| async move { client.list_user(rq).await }).await
}

pub async fn create_post(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Response {
    forward(ctx, headers, bind_json(payload), |rq| async move { client.create_post(rq).await }).await
}

pub async fn update_post(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Response {
    let bound = bind_path(path).and_then(|post_id| {
        bind_json(payload).map(|rq| UpdatePostRequest { post_id, ..rq })
    });
    forward(ctx, headers, bound, |rq| async move { client.update_post(rq).await }).await
}

pub async fn delete_posts(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    payload: Result<Json<DeletePostRequest>, JsonRejection>,
) -> Response {
    forward(ctx, headers, bind_json(payload), |rq| async move { client.delete_post(rq).await }).await
}

pub async fn get_post(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let bound = bind_path(path).map(|post_id| GetPostRequest { post_id });
    forward(ctx, headers, bound, |rq| async move { client.get_post(rq).await }).await
}

pub async fn list_posts(
    Extension(mut client): Extension<Client>,
    ctx: ContextExtractor,
    headers: HeaderMap,
    query: Result<Query<ListPostRequest>, QueryRejection>,
) -> Response {
    forward(ctx, headers, bind_query(query), |rq| async move { client.list_post(rq).await }).await
}
