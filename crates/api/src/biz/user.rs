use futures::{StreamExt, TryStreamExt, stream};

use fastblog_auth::{PasswordError, PasswordHasher, TokenManager};
use fastblog_core::{Errorx, RequestContext};
use fastblog_store::{Store, UserM, Where};

use crate::biz::conversion::{format_time, user_to_pb};
use crate::biz::{MAX_FAN_OUT_CONCURRENCY, caller_id};
use crate::pb::v1::{
    ChangePasswordRequest, ChangePasswordResponse, CreateUserRequest, CreateUserResponse, DeleteUserRequest,
    DeleteUserResponse, GetUserRequest, GetUserResponse, ListUserRequest, ListUserResponse, LoginRequest,
    LoginResponse, RefreshTokenRequest, RefreshTokenResponse, UpdateUserRequest, UpdateUserResponse,
};

pub struct UserBiz<'a> {
    store: &'a Store,
    tokens: &'a TokenManager,
    hasher: PasswordHasher,
}

impl<'a> UserBiz<'a> {
    pub(crate) fn new(store: &'a Store, tokens: &'a TokenManager, hasher: PasswordHasher) -> Self {
        Self { store, tokens, hasher }
    }

    pub async fn login(&self, ctx: &RequestContext, rq: LoginRequest) -> Result<LoginResponse, Errorx> {
        let user = self
            .store
            .user()
            .get(ctx, &Where::new().f("username", rq.username))
            .await?;

        self.compare(user.password, rq.password).await?;

        let (token, expire_at) = self.sign(ctx, &user.user_id)?;
        Ok(LoginResponse { token, expire_at })
    }

    pub async fn refresh_token(
        &self,
        ctx: &RequestContext,
        _rq: RefreshTokenRequest,
    ) -> Result<RefreshTokenResponse, Errorx> {
        let user_id = caller_id(ctx, "")?;
        let (token, expire_at) = self.sign(ctx, &user_id)?;
        Ok(RefreshTokenResponse { token, expire_at })
    }

    pub async fn change_password(
        &self,
        ctx: &RequestContext,
        rq: ChangePasswordRequest,
    ) -> Result<ChangePasswordResponse, Errorx> {
        let user_id = caller_id(ctx, &rq.user_id)?;
        let mut user = self.store.user().get(ctx, &Where::new().f("user_id", user_id)).await?;

        self.compare(user.password.clone(), rq.old_password).await?;
        user.password = self.encrypt(rq.new_password).await?;
        self.store.user().update(ctx, &mut user).await?;

        Ok(ChangePasswordResponse {})
    }

    pub async fn create(&self, ctx: &RequestContext, rq: CreateUserRequest) -> Result<CreateUserResponse, Errorx> {
        let mut user = UserM {
            username: rq.username,
            password: self.encrypt(rq.password).await?,
            nickname: rq.nickname.unwrap_or_default(),
            email: rq.email,
            phone: rq.phone,
            ..UserM::default()
        };
        self.store.user().create(ctx, &mut user).await?;

        tracing::info!(request_id = ctx.request_id(), user_id = %user.user_id, "user created");
        Ok(CreateUserResponse { user_id: user.user_id })
    }

    /// Apply only the fields present in the request.
    pub async fn update(&self, ctx: &RequestContext, rq: UpdateUserRequest) -> Result<UpdateUserResponse, Errorx> {
        let user_id = caller_id(ctx, &rq.user_id)?;
        let mut user = self.store.user().get(ctx, &Where::new().f("user_id", user_id)).await?;

        if let Some(username) = rq.username {
            user.username = username;
        }
        if let Some(nickname) = rq.nickname {
            user.nickname = nickname;
        }
        if let Some(email) = rq.email {
            user.email = email;
        }
        if let Some(phone) = rq.phone {
            user.phone = phone;
        }
        self.store.user().update(ctx, &mut user).await?;

        Ok(UpdateUserResponse {})
    }

    /// Remove the caller and their posts in one transaction.
    pub async fn delete(&self, ctx: &RequestContext, rq: DeleteUserRequest) -> Result<DeleteUserResponse, Errorx> {
        let user_id = caller_id(ctx, &rq.user_id)?;
        let store = self.store.clone();

        self.store
            .transaction(ctx, move |tx| async move {
                store.post().delete(&tx, &Where::new().f("user_id", &user_id)).await?;
                store.user().delete(&tx, &Where::new().f("user_id", &user_id)).await
            })
            .await?;

        Ok(DeleteUserResponse {})
    }

    pub async fn get(&self, ctx: &RequestContext, rq: GetUserRequest) -> Result<GetUserResponse, Errorx> {
        let user_id = caller_id(ctx, &rq.user_id)?;
        let user = self.store.user().get(ctx, &Where::new().f("user_id", &user_id)).await?;
        let post_count = self.store.post().count(ctx, &Where::new().f("user_id", &user_id)).await?;

        Ok(GetUserResponse {
            user: Some(user_to_pb(&user, post_count)),
        })
    }

    /// One page of users, each with its own post count.
    ///
    /// Post counts are fetched concurrently (at most
    /// [`MAX_FAN_OUT_CONCURRENCY`] at a time) and in page order; the first
    /// failure aborts the whole list.
    pub async fn list(&self, ctx: &RequestContext, rq: ListUserRequest) -> Result<ListUserResponse, Errorx> {
        let (total_count, users) = self
            .store
            .user()
            .list(ctx, &Where::new().p(rq.offset, rq.limit))
            .await?;

        let users = stream::iter(users)
            .map(|user| {
                let store = self.store.clone();
                let ctx = ctx.clone();
                async move {
                    let count = store
                        .post()
                        .count(&ctx, &Where::new().f("user_id", &user.user_id))
                        .await?;
                    Ok::<_, Errorx>(user_to_pb(&user, count))
                }
            })
            .buffered(MAX_FAN_OUT_CONCURRENCY)
            .try_collect::<Vec<_>>()
            .await?;

        Ok(ListUserResponse { total_count, users })
    }

    fn sign(&self, ctx: &RequestContext, user_id: &str) -> Result<(String, String), Errorx> {
        let (token, expire_at) = self.tokens.sign(user_id).map_err(|e| {
            tracing::error!(request_id = ctx.request_id(), error = %e, "failed to sign token");
            Errorx::SIGN_TOKEN
        })?;
        Ok((token, format_time(expire_at)))
    }

    async fn encrypt(&self, password: String) -> Result<String, Errorx> {
        let hasher = self.hasher;
        let result = tokio::task::spawn_blocking(move || hasher.encrypt(&password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "password hashing task failed");
                Errorx::INTERNAL
            })?;
        result.map_err(|e| {
            tracing::error!(error = %e, "failed to encrypt password");
            Errorx::INTERNAL
        })
    }

    async fn compare(&self, hash: String, password: String) -> Result<(), Errorx> {
        let hasher = self.hasher;
        let result = tokio::task::spawn_blocking(move || hasher.compare(&hash, &password))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "password comparison task failed");
                Errorx::INTERNAL
            })?;
        match result {
            Ok(()) => Ok(()),
            Err(PasswordError::Mismatch) => Err(Errorx::PASSWORD_INVALID),
            Err(e) => {
                tracing::error!(error = %e, "stored password hash is unreadable");
                Err(Errorx::INTERNAL)
            }
        }
    }
}
