use fastblog_core::{Errorx, RequestContext};
use fastblog_store::{PostM, Store, Where};

use crate::biz::caller_id;
use crate::biz::conversion::post_to_pb;
use crate::pb::v1::{
    CreatePostRequest, CreatePostResponse, DeletePostRequest, DeletePostResponse, GetPostRequest, GetPostResponse,
    ListPostRequest, ListPostResponse, UpdatePostRequest, UpdatePostResponse,
};

pub struct PostBiz<'a> {
    store: &'a Store,
}

impl<'a> PostBiz<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub async fn create(&self, ctx: &RequestContext, rq: CreatePostRequest) -> Result<CreatePostResponse, Errorx> {
        let mut post = PostM {
            user_id: caller_id(ctx, "")?,
            title: rq.title,
            content: rq.content,
            ..PostM::default()
        };
        self.store.post().create(ctx, &mut post).await?;

        Ok(CreatePostResponse { post_id: post.post_id })
    }

    /// Apply only the fields present in the request to the caller's post.
    pub async fn update(&self, ctx: &RequestContext, rq: UpdatePostRequest) -> Result<UpdatePostResponse, Errorx> {
        let user_id = caller_id(ctx, "")?;
        let mut post = self
            .store
            .post()
            .get(ctx, &Where::new().f("user_id", user_id).f("post_id", rq.post_id))
            .await?;

        if let Some(title) = rq.title {
            post.title = title;
        }
        if let Some(content) = rq.content {
            post.content = content;
        }
        self.store.post().update(ctx, &mut post).await?;

        Ok(UpdatePostResponse {})
    }

    /// Delete the caller's posts among `postIDs`; other IDs are ignored.
    pub async fn delete(&self, ctx: &RequestContext, rq: DeletePostRequest) -> Result<DeletePostResponse, Errorx> {
        let user_id = caller_id(ctx, "")?;
        self.store
            .post()
            .delete(ctx, &Where::new().f("user_id", user_id).is_in("post_id", rq.post_ids))
            .await?;

        Ok(DeletePostResponse {})
    }

    pub async fn get(&self, ctx: &RequestContext, rq: GetPostRequest) -> Result<GetPostResponse, Errorx> {
        let user_id = caller_id(ctx, "")?;
        let post = self
            .store
            .post()
            .get(ctx, &Where::new().f("user_id", user_id).f("post_id", rq.post_id))
            .await?;

        Ok(GetPostResponse {
            post: Some(post_to_pb(&post)),
        })
    }

    pub async fn list(&self, ctx: &RequestContext, rq: ListPostRequest) -> Result<ListPostResponse, Errorx> {
        let mut opts = Where::new();
        if let Some(title) = rq.title.as_deref().filter(|t| !t.is_empty()) {
            opts = opts.contains("title", title);
        }

        let (total_count, posts) = self.store.post().list(ctx, &opts.p(rq.offset, rq.limit)).await?;

        Ok(ListPostResponse {
            total_count,
            posts: posts.iter().map(post_to_pb).collect(),
        })
    }
}
