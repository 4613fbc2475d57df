use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tonic::{Request, Response, Status};

use fastblog_auth::TokenManager;
use fastblog_core::{Errorx, RequestContext};

use crate::biz::Biz;
use crate::biz::conversion::format_time;
use crate::context::RequestId;
use crate::grpc::status::to_status;
use crate::middleware::bearer_token;
use crate::pb::v1::fast_blog_server::FastBlog;
use crate::pb::v1::*;
use crate::pipeline::{Validator, read_request};
use crate::validation;

const AUTHORIZATION: &str = "authorization";

/// `fastblog.v1.FastBlog` implementation over the business services.
#[derive(Clone)]
pub struct FastBlogService {
    biz: Biz,
    tokens: Arc<TokenManager>,
}

impl FastBlogService {
    pub fn new(biz: Biz, tokens: Arc<TokenManager>) -> Self {
        Self { biz, tokens }
    }

    fn context<T>(&self, request: &Request<T>, authenticate: bool) -> Result<RequestContext, Errorx> {
        let request_id = request
            .extensions()
            .get::<RequestId>()
            .cloned()
            .unwrap_or_else(RequestId::generate);
        let ctx = RequestContext::new(request_id.0);
        if !authenticate {
            return Ok(ctx);
        }

        let token = request
            .metadata()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or(Errorx::TOKEN_INVALID)?;
        let user_id = self.tokens.parse(token).map_err(|e| {
            tracing::debug!(request_id = ctx.request_id(), error = %e, "rejected bearer token");
            Errorx::TOKEN_INVALID
        })?;
        Ok(ctx.with_user_id(user_id))
    }

    /// Same sequence as the HTTP pipeline; binding is done by the codec.
    async fn handle<T, R, H, Fut>(
        &self,
        request: Request<T>,
        authenticate: bool,
        validators: &[Validator<T>],
        handler: H,
    ) -> Result<Response<R>, Status>
    where
        H: FnOnce(RequestContext, T) -> Fut,
        Fut: Future<Output = Result<R, Errorx>>,
    {
        let ctx = self.context(&request, authenticate).map_err(|e| to_status(&e))?;

        let result = match read_request(&ctx, Ok(request.into_inner()), validators) {
            Ok(rq) => handler(ctx.clone(), rq).await,
            Err(err) => Err(err),
        };

        result.map(Response::new).map_err(|err| {
            if err.code() >= 500 {
                tracing::error!(request_id = ctx.request_id(), reason = err.reason(), "rpc failed");
            }
            to_status(&err)
        })
    }
}

#[tonic::async_trait]
impl FastBlog for FastBlogService {
    async fn healthz(&self, _request: Request<HealthzRequest>) -> Result<Response<HealthzResponse>, Status> {
        Ok(Response::new(HealthzResponse {
            status: ServiceStatus::Healthy as i32,
            timestamp: format_time(Utc::now()),
            message: String::new(),
        }))
    }

    async fn login(&self, request: Request<LoginRequest>) -> Result<Response<LoginResponse>, Status> {
        self.handle(request, false, &[validation::validate_login_request], |ctx, rq| async move {
            self.biz.user().login(&ctx, rq).await
        })
        .await
    }

    async fn refresh_token(
        &self,
        request: Request<RefreshTokenRequest>,
    ) -> Result<Response<RefreshTokenResponse>, Status> {
        self.handle(request, true, &[validation::validate_refresh_token_request], |ctx, rq| async move {
            self.biz.user().refresh_token(&ctx, rq).await
        })
        .await
    }

    async fn change_password(
        &self,
        request: Request<ChangePasswordRequest>,
    ) -> Result<Response<ChangePasswordResponse>, Status> {
        self.handle(request, true, &[validation::validate_change_password_request], |ctx, rq| async move {
            self.biz.user().change_password(&ctx, rq).await
        })
        .await
    }

    async fn create_user(&self, request: Request<CreateUserRequest>) -> Result<Response<CreateUserResponse>, Status> {
        self.handle(request, false, &[validation::validate_create_user_request], |ctx, rq| async move {
            self.biz.user().create(&ctx, rq).await
        })
        .await
    }

    async fn update_user(&self, request: Request<UpdateUserRequest>) -> Result<Response<UpdateUserResponse>, Status> {
        self.handle(request, true, &[validation::validate_update_user_request], |ctx, rq| async move {
            self.biz.user().update(&ctx, rq).await
        })
        .await
    }

    async fn delete_user(&self, request: Request<DeleteUserRequest>) -> Result<Response<DeleteUserResponse>, Status> {
        self.handle(request, true, &[validation::validate_delete_user_request], |ctx, rq| async move {
            self.biz.user().delete(&ctx, rq).await
        })
        .await
    }

    async fn get_user(&self, request: Request<GetUserRequest>) -> Result<Response<GetUserResponse>, Status> {
        self.handle(request, true, &[validation::validate_get_user_request], |ctx, rq| async move {
            self.biz.user().get(&ctx, rq).await
        })
        .await
    }

    async fn list_user(&self, request: Request<ListUserRequest>) -> Result<Response<ListUserResponse>, Status> {
        self.handle(request, true, &[validation::validate_list_user_request], |ctx, rq| async move {
            self.biz.user().list(&ctx, rq).await
        })
        .await
    }

    async fn create_post(&self, request: Request<CreatePostRequest>) -> Result<Response<CreatePostResponse>, Status> {
        self.handle(request, true, &[validation::validate_create_post_request], |ctx, rq| async move {
            self.biz.post().create(&ctx, rq).await
        })
        .await
    }

    async fn update_post(&self, request: Request<UpdatePostRequest>) -> Result<Response<UpdatePostResponse>, Status> {
        self.handle(request, true, &[validation::validate_update_post_request], |ctx, rq| async move {
            self.biz.post().update(&ctx, rq).await
        })
        .await
    }

    async fn delete_post(&self, request: Request<DeletePostRequest>) -> Result<Response<DeletePostResponse>, Status> {
        self.handle(request, true, &[validation::validate_delete_post_request], |ctx, rq| async move {
            self.biz.post().delete(&ctx, rq).await
        })
        .await
    }

    async fn get_post(&self, request: Request<GetPostRequest>) -> Result<Response<GetPostResponse>, Status> {
        self.handle(request, true, &[validation::validate_get_post_request], |ctx, rq| async move {
            self.biz.post().get(&ctx, rq).await
        })
        .await
    }

    async fn list_post(&self, request: Request<ListPostRequest>) -> Result<Response<ListPostResponse>, Status> {
        self.handle(request, true, &[validation::validate_list_post_request], |ctx, rq| async move {
            self.biz.post().list(&ctx, rq).await
        })
        .await
    }
}
