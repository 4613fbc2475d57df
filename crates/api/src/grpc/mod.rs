//! gRPC surface: the `fastblog.v1.FastBlog` service and its plumbing.

pub mod interceptor;
pub mod service;
pub mod status;

pub use service::FastBlogService;
pub use status::{X_ERROR_REASON, from_status, to_status};
