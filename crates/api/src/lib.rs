//! `fastblog-apiserver`: the blog API over HTTP, gRPC and a gRPC gateway.
//!
//! Layout:
//! - `pipeline`/`validation`: the bind → validate → invoke → respond sequence
//! - `biz`: user and post business services over the store
//! - `app`: the REST router; `grpc`: the gRPC service; `gateway`: REST → gRPC
//! - `server`: protocol servers and the signal-driven union server

pub mod app;
pub mod biz;
pub mod config;
pub mod context;
pub mod gateway;
pub mod grpc;
pub mod middleware;
pub mod pb;
pub mod pipeline;
pub mod server;
pub mod validation;
pub mod version;
