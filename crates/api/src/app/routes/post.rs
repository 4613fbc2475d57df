use axum::{
    extract::{
        Extension, Json, Path, Query,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    response::Response,
};

use crate::biz::Biz;
use crate::context::ContextExtractor;
use crate::pb::v1::{CreatePostRequest, DeletePostRequest, GetPostRequest, ListPostRequest, UpdatePostRequest};
use crate::pipeline::{bind_json, bind_path, bind_query, handle_request};
use crate::validation;

pub async fn create_post(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_json(payload),
        &[validation::validate_create_post_request],
        move |ctx, rq| async move { biz.post().create(&ctx, rq).await },
    )
    .await
}

pub async fn update_post(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Response {
    let bound = bind_path(path).and_then(|post_id| {
        bind_json(payload).map(|rq| UpdatePostRequest { post_id, ..rq })
    });
    handle_request(
        ctx,
        bound,
        &[validation::validate_update_post_request],
        move |ctx, rq| async move { biz.post().update(&ctx, rq).await },
    )
    .await
}

pub async fn delete_posts(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    payload: Result<Json<DeletePostRequest>, JsonRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_json(payload),
        &[validation::validate_delete_post_request],
        move |ctx, rq| async move { biz.post().delete(&ctx, rq).await },
    )
    .await
}

pub async fn get_post(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_path(path).map(|post_id| GetPostRequest { post_id }),
        &[validation::validate_get_post_request],
        move |ctx, rq| async move { biz.post().get(&ctx, rq).await },
    )
    .await
}

pub async fn list_posts(
    Extension(biz): Extension<Biz>,
    ContextExtractor(ctx): ContextExtractor,
    query: Result<Query<ListPostRequest>, QueryRejection>,
) -> Response {
    handle_request(
        ctx,
        bind_query(query),
        &[validation::validate_list_post_request],
        move |ctx, rq| async move { biz.post().list(&ctx, rq).await },
    )
    .await
}
