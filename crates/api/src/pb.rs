//! Generated protobuf/gRPC types.

pub mod v1 {
    tonic::include_proto!("fastblog.v1");
}

/// Encoded descriptors for server reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("fastblog_descriptor");
