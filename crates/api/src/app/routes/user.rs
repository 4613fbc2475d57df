use axum::{
    extract::{
        Extension, Json, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::Response,
};

use crate::biz::Biz;
use crate::context::ContextExtractor;
use crate::pb::v1::{
    ChangePasswordRequest, CreateUserRequest, DeleteUserRequest, GetUserRequest, ListUserRequest, LoginRequest,
    RefreshTokenRequest, UpdateUserRequest,
};
use crate::pipeline::{bind_json, bind_path, bind_query, handle_request};
use crate::validation;

pub async fn login(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_json(payload),
        &[validation::validate_login_request],
        move |ctx, rq| async move { biz.user().login(&ctx, rq).await },
    )
    .await
}

pub async fn refresh_token(Extension(biz): Extension<Biz>, ContextExtractor(ctx): ContextExtractor) -> Response {
    handle_request(
        ctx,
        Ok(RefreshTokenRequest {}),
        &[validation::validate_refresh_token_request],
        move |ctx, rq| async move { biz.user().refresh_token(&ctx, rq).await },
    )
    .await
}

pub async fn change_password(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Response {
    let bound = bind_path(path).and_then(|user_id| {
        bind_json(payload).map(|rq| ChangePasswordRequest { user_id, ..rq })
    });
    handle_request(
        ctx,
        bound,
        &[validation::validate_change_password_request],
        move |ctx, rq| async move { biz.user().change_password(&ctx, rq).await },
    )
    .await
}

pub async fn create_user(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_json(payload),
        &[validation::validate_create_user_request],
        move |ctx, rq| async move { biz.user().create(&ctx, rq).await },
    )
    .await
}

pub async fn update_user(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Response {
    let bound = bind_path(path).and_then(|user_id| {
        bind_json(payload).map(|rq| UpdateUserRequest { user_id, ..rq })
    });
    handle_request(
        ctx,
        bound,
        &[validation::validate_update_user_request],
        move |ctx, rq| async move { biz.user().update(&ctx, rq).await },
    )
    .await
}

pub async fn delete_user(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_path(path).map(|user_id| DeleteUserRequest { user_id }),
        &[validation::validate_delete_user_request],
        move |ctx, rq| async move { biz.user().delete(&ctx, rq).await },
    )
    .await
}

pub async fn get_user(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_path(path).map(|user_id| GetUserRequest { user_id }),
        &[validation::validate_get_user_request],
        move |ctx, rq| async move { biz.user().get(&ctx, rq).await },
    )
    .await
}

pub async fn list_users(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    query: Result<Query<ListUserRequest>, QueryRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_query(query),
        &[validation::validate_list_user_request],
        move |ctx, rq| async move { biz.user().list(&ctx, rq).await },
    )
    .await
}
