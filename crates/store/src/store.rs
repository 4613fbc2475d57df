//! Store façade: the single data-access entry point for the business layer.

use std::future::Future;
use std::sync::Arc;

use sqlx::any::AnyQueryResult;
use sqlx::{AnyConnection, AnyPool};
use tokio::sync::Mutex;

use fastblog_core::{Errorx, RequestContext, TxHandle};

use crate::post::PostStore;
use crate::user::UserStore;

/// Run `$body` against the request's transaction if one is open, otherwise
/// against a connection checked out of the pool. `$conn` is a
/// `&mut AnyConnection` in both arms and `$body` yields `Result<_, sqlx::Error>`.
macro_rules! with_conn {
    ($store:expr, $ctx:expr, |$conn:ident| $body:expr) => {
        match $ctx.tx() {
            Some(tx) => {
                let mut guard = tx.lock().await;
                let $conn: &mut sqlx::AnyConnection = &mut **guard;
                $body
            }
            None => match $store.pool.acquire().await {
                Ok(mut pooled) => {
                    let $conn: &mut sqlx::AnyConnection = &mut *pooled;
                    $body
                }
                Err(e) => Err(e),
            },
        }
    };
}
pub(crate) use with_conn;

/// Shared handle over the connection pool.
///
/// Cheap to clone; sub-stores borrow it.
#[derive(Clone, Debug)]
pub struct Store {
    pub(crate) pool: AnyPool,
}

impl Store {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn user(&self) -> UserStore<'_> {
        UserStore::new(self)
    }

    pub fn post(&self) -> PostStore<'_> {
        PostStore::new(self)
    }

    /// Run `f` inside a database transaction.
    ///
    /// When `ctx` already carries a transaction, `f` runs against it and the
    /// outer scope decides the outcome. Otherwise a new transaction is opened,
    /// handed to `f` through a derived context, committed when `f` returns
    /// `Ok` and rolled back when it returns `Err`. If the future is dropped
    /// or panics, the uncommitted transaction is rolled back on drop.
    pub async fn transaction<T, F, Fut>(&self, ctx: &RequestContext, f: F) -> Result<T, Errorx>
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = Result<T, Errorx>>,
    {
        if ctx.tx().is_some() {
            return f(ctx.clone()).await;
        }

        let tx = self.pool.begin().await.map_err(|e| {
            tracing::error!(request_id = ctx.request_id(), error = %e, "failed to begin transaction");
            Errorx::DB_WRITE
        })?;
        let handle: TxHandle = Arc::new(Mutex::new(tx));

        let result = f(ctx.with_tx(Arc::clone(&handle))).await;

        let tx = match Arc::try_unwrap(handle) {
            Ok(mutex) => mutex.into_inner(),
            Err(_) => {
                // Someone kept the scope alive past the closure; it rolls back on last drop.
                tracing::error!(request_id = ctx.request_id(), "transaction handle escaped its scope");
                return Err(Errorx::DB_WRITE);
            }
        };

        match result {
            Ok(value) => {
                tx.commit().await.map_err(|e| {
                    tracing::error!(request_id = ctx.request_id(), error = %e, "failed to commit transaction");
                    Errorx::DB_WRITE
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(e) = tx.rollback().await {
                    tracing::warn!(request_id = ctx.request_id(), error = %e, "failed to roll back transaction");
                }
                Err(err)
            }
        }
    }
}

/// Map a read failure; `RowNotFound` becomes the entity's not-found error.
pub(crate) fn map_read_error(ctx: &RequestContext, operation: &str, not_found: Errorx, err: sqlx::Error) -> Errorx {
    match err {
        sqlx::Error::RowNotFound => not_found,
        other => {
            tracing::error!(request_id = ctx.request_id(), operation, error = %other, "database read failed");
            Errorx::DB_READ
        }
    }
}

pub(crate) fn map_write_error(ctx: &RequestContext, operation: &str, err: sqlx::Error) -> Errorx {
    tracing::error!(request_id = ctx.request_id(), operation, error = %err, "database write failed");
    Errorx::DB_WRITE
}

/// Primary key of the row `done` inserted.
///
/// The `Any` driver does not report it for every backend (SQLite returns
/// `None`), so fall back to looking the row up by its unique public ID on the
/// same connection.
pub(crate) async fn inserted_id(
    conn: &mut AnyConnection,
    done: AnyQueryResult,
    lookup_sql: &str,
    public_id: &str,
) -> Result<i64, sqlx::Error> {
    if let Some(id) = done.last_insert_id() {
        return Ok(id);
    }
    sqlx::query_scalar(lookup_sql).bind(public_id.to_string()).fetch_one(conn).await
}

/// Check if an error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
