//! `fastblog-core`: building blocks shared by every layer of the API server.
//!
//! Nothing in here knows about HTTP or gRPC.

pub mod context;
pub mod error;
pub mod id;

pub use context::{RequestContext, TxHandle};
pub use error::{ErrorResponse, Errorx};
pub use id::ResourceKind;
