//! `fastblog-store`: SQL persistence for users and posts.
//!
//! Runs on the `sqlx` `Any` driver: MySQL in production, SQLite for local
//! runs and tests. Every operation takes the request context so it can join
//! the request's open transaction.

pub mod filter;
pub mod model;
pub mod post;
pub mod schema;
pub mod store;
pub mod user;

pub use filter::Where;
pub use model::{PostM, UserM};
pub use post::PostStore;
pub use store::Store;
pub use user::UserStore;
