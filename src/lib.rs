pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod grpc;
pub mod inventory;
pub mod job;
pub mod normalize;
pub mod probe;
pub mod shutdown;

// Re-export generated protobuf types
pub mod proto {
    tonic::include_proto!("dispatch");
}
