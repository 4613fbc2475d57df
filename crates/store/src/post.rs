//! `post` table access.

use chrono::Utc;

use fastblog_core::{Errorx, RequestContext, ResourceKind};

use crate::filter::Where;
use crate::model::{POST_COLUMNS, PostM};
use crate::store::{Store, inserted_id, map_read_error, map_write_error, with_conn};

pub struct PostStore<'a> {
    store: &'a Store,
}

impl<'a> PostStore<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Insert `obj`, assigning its `id`, `post_id` and timestamps.
    pub async fn create(&self, ctx: &RequestContext, obj: &mut PostM) -> Result<(), Errorx> {
        let now = Utc::now();
        if obj.post_id.is_empty() {
            obj.post_id = ResourceKind::Post.new_id();
        }
        obj.created_at = now;
        obj.updated_at = now;

        let sql = "INSERT INTO post (user_id, post_id, title, content, created_at, updated_at) \
                   VALUES (?, ?, ?, ?, ?, ?)";
        let id = with_conn!(self.store, ctx, |conn| {
            async {
                let done = sqlx::query(sql)
                    .bind(obj.user_id.clone())
                    .bind(obj.post_id.clone())
                    .bind(obj.title.clone())
                    .bind(obj.content.clone())
                    .bind(now.timestamp())
                    .bind(now.timestamp())
                    .execute(&mut *conn)
                    .await?;
                inserted_id(&mut *conn, done, "SELECT id FROM post WHERE post_id = ?", &obj.post_id).await
            }
            .await
        })
        .map_err(|e| map_write_error(ctx, "post.create", e))?;

        obj.id = id;
        Ok(())
    }

    pub async fn update(&self, ctx: &RequestContext, obj: &mut PostM) -> Result<(), Errorx> {
        obj.updated_at = Utc::now();
        let sql = "UPDATE post SET title = ?, content = ?, updated_at = ? WHERE id = ?";
        with_conn!(self.store, ctx, |conn| {
            sqlx::query(sql)
                .bind(obj.title.clone())
                .bind(obj.content.clone())
                .bind(obj.updated_at.timestamp())
                .bind(obj.id)
                .execute(conn)
                .await
        })
        .map(|_| ())
        .map_err(|e| map_write_error(ctx, "post.update", e))
    }

    /// Delete matching rows. Matching nothing is not an error.
    pub async fn delete(&self, ctx: &RequestContext, opts: &Where) -> Result<(), Errorx> {
        if !opts.has_conditions() {
            tracing::error!(request_id = ctx.request_id(), "refusing to delete posts without conditions");
            return Err(Errorx::DB_WRITE);
        }
        let sql = format!("DELETE FROM post{}", opts.where_sql());
        with_conn!(self.store, ctx, |conn| {
            opts.bind(sqlx::query(&sql)).execute(conn).await
        })
        .map(|_| ())
        .map_err(|e| map_write_error(ctx, "post.delete", e))
    }

    /// First matching row by primary key, or `NotFound.PostNotFound`.
    pub async fn get(&self, ctx: &RequestContext, opts: &Where) -> Result<PostM, Errorx> {
        let sql = format!("SELECT {POST_COLUMNS} FROM post{} ORDER BY id LIMIT 1", opts.where_sql());
        with_conn!(self.store, ctx, |conn| {
            opts.bind(sqlx::query(&sql)).fetch_one(conn).await
        })
        .and_then(|row| <PostM as sqlx::FromRow<_>>::from_row(&row))
        .map_err(|e| map_read_error(ctx, "post.get", Errorx::POST_NOT_FOUND, e))
    }

    /// Number of matching rows, ignoring pagination.
    pub async fn count(&self, ctx: &RequestContext, opts: &Where) -> Result<i64, Errorx> {
        let sql = format!("SELECT COUNT(*) FROM post{}", opts.where_sql());
        with_conn!(self.store, ctx, |conn| {
            opts.bind_scalar(sqlx::query_scalar::<_, i64>(&sql)).fetch_one(conn).await
        })
        .map_err(|e| map_read_error(ctx, "post.count", Errorx::DB_READ, e))
    }

    /// One page of matching posts (newest first) plus the unpaged match count.
    pub async fn list(&self, ctx: &RequestContext, opts: &Where) -> Result<(i64, Vec<PostM>), Errorx> {
        let count_sql = format!("SELECT COUNT(*) FROM post{}", opts.where_sql());
        let list_sql = format!(
            "SELECT {POST_COLUMNS} FROM post{} ORDER BY id DESC{}",
            opts.where_sql(),
            opts.page_sql()
        );

        let result = with_conn!(self.store, ctx, |conn| {
            async {
                let count: i64 = opts
                    .bind_scalar(sqlx::query_scalar(&count_sql))
                    .fetch_one(&mut *conn)
                    .await?;
                let rows = opts
                    .bind_page(opts.bind(sqlx::query(&list_sql)))
                    .fetch_all(&mut *conn)
                    .await?;
                let posts = rows
                    .iter()
                    .map(<PostM as sqlx::FromRow<_>>::from_row)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, sqlx::Error>((count, posts))
            }
            .await
        });

        result.map_err(|e| map_read_error(ctx, "post.list", Errorx::DB_READ, e))
    }
}
