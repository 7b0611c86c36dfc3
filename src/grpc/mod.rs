pub mod dispatch_service;
pub mod server;

pub use dispatch_service::DispatchApi;
pub use server::GrpcServer;
