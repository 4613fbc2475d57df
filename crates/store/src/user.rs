//! `user` table access.

use chrono::Utc;

use fastblog_core::{Errorx, RequestContext, ResourceKind};

use crate::filter::Where;
use crate::model::{USER_COLUMNS, UserM};
use crate::store::{Store, inserted_id, is_unique_violation, map_read_error, map_write_error, with_conn};

pub struct UserStore<'a> {
    store: &'a Store,
}

impl<'a> UserStore<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert `obj`, assigning its `id`, `user_id` and timestamps.
    pub async fn create(&self, ctx: &RequestContext, obj: &mut UserM) -> Result<(), Errorx> {
        let now = Utc::now();
        if obj.user_id.is_empty() {
            obj.user_id = ResourceKind::User.new_id();
        }
        obj.created_at = now;
        obj.updated_at = now;

        let sql = "INSERT INTO user (user_id, username, password, nickname, email, phone, created_at, updated_at) \
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)";
        let result = with_conn!(self.store, ctx, |conn| {
            async {
                let done = sqlx::query(sql)
                    .bind(obj.user_id.clone())
                    .bind(obj.username.clone())
                    .bind(obj.password.clone())
                    .bind(obj.nickname.clone())
                    .bind(obj.email.clone())
                    .bind(obj.phone.clone())
                    .bind(now.timestamp())
                    .bind(now.timestamp())
                    .execute(&mut *conn)
                    .await?;
                inserted_id(&mut *conn, done, "SELECT id FROM user WHERE user_id = ?", &obj.user_id).await
            }
            .await
        });

        match result {
            Ok(id) => {
                obj.id = id;
                Ok(())
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!(request_id = ctx.request_id(), username = %obj.username, "user already exists");
                Err(Errorx::USER_ALREADY_EXISTS)
            }
            Err(e) => Err(map_write_error(ctx, "user.create", e)),
        }
    }

    /// Persist every mutable column of `obj`, keyed by its primary key.
    pub async fn update(&self, ctx: &RequestContext, obj: &mut UserM) -> Result<(), Errorx> {
        obj.updated_at = Utc::now();
        let sql = "UPDATE user SET username = ?, password = ?, nickname = ?, email = ?, phone = ?, updated_at = ? \
                   WHERE id = ?";
        let result = with_conn!(self.store, ctx, |conn| {
            sqlx::query(sql)
                .bind(obj.username.clone())
                .bind(obj.password.clone())
                .bind(obj.nickname.clone())
                .bind(obj.email.clone())
                .bind(obj.phone.clone())
                .bind(obj.updated_at.timestamp())
                .bind(obj.id)
                .execute(conn)
                .await
        });

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Errorx::USER_ALREADY_EXISTS),
            Err(e) => Err(map_write_error(ctx, "user.update", e)),
        }
    }

    /// Delete matching rows. Matching nothing is not an error.
    pub async fn delete(&self, ctx: &RequestContext, opts: &Where) -> Result<(), Errorx> {
        if !opts.has_conditions() {
            tracing::error!(request_id = ctx.request_id(), "refusing to delete users without conditions");
            return Err(Errorx::DB_WRITE);
        }
        let sql = format!("DELETE FROM user{}", opts.where_sql());
        with_conn!(self.store, ctx, |conn| {
            opts.bind(sqlx::query(&sql)).execute(conn).await
        })
        .map(|_| ())
        .map_err(|e| map_write_error(ctx, "user.delete", e))
    }

    /// First matching row by primary key, or `NotFound.UserNotFound`.
    pub async fn get(&self, ctx: &RequestContext, opts: &Where) -> Result<UserM, Errorx> {
        let sql = format!("SELECT {USER_COLUMNS} FROM user{} ORDER BY id LIMIT 1", opts.where_sql());
        with_conn!(self.store, ctx, |conn| {
            opts.bind(sqlx::query(&sql)).fetch_one(conn).await
        })
        .and_then(|row| <UserM as sqlx::FromRow<_>>::from_row(&row))
        .map_err(|e| map_read_error(ctx, "user.get", Errorx::USER_NOT_FOUND, e))
    }

    /// One page of matching users (newest first) plus the unpaged match count.
    pub async fn list(&self, ctx: &RequestContext, opts: &Where) -> Result<(i64, Vec<UserM>), Errorx> {
        let count_sql = format!("SELECT COUNT(*) FROM user{}", opts.where_sql());
        let list_sql = format!(
            "SELECT {USER_COLUMNS} FROM user{} ORDER BY id DESC{}",
            opts.where_sql(),
            opts.page_sql()
        );

        let result: Result<(i64, Vec<UserM>), sqlx::Error> = with_conn!(self.store, ctx, |conn| {
            async {
                let count: i64 = opts
                    .bind_scalar(sqlx::query_scalar(&count_sql))
                    .fetch_one(&mut *conn)
                    .await?;
                let rows = opts
                    .bind_page(opts.bind(sqlx::query(&list_sql)))
                    .fetch_all(&mut *conn)
                    .await?;
                let users = rows
                    .iter()
                    .map(<UserM as sqlx::FromRow<_>>::from_row)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, sqlx::Error>((count, users))
            }
            .await
        });

        result.map_err(|e| map_read_error(ctx, "user.list", Errorx::DB_READ, e))
    }
}
