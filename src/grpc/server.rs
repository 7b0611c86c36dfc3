use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

use crate::coordinator::JobCoordinator;
use crate::grpc::dispatch_service::DispatchApi;
use crate::proto::dispatch_service_server::DispatchServiceServer;

pub struct GrpcServer {
    addr: SocketAddr,
    coordinator: JobCoordinator,
}

impl GrpcServer {
    pub fn new(addr: SocketAddr, coordinator: JobCoordinator) -> Self {
        Self { addr, coordinator }
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<(), tonic::transport::Error> {
        let service = DispatchApi::new(self.coordinator);

        tracing::info!(addr = %self.addr, "starting dispatch API server");

        Server::builder()
            .add_service(DispatchServiceServer::new(service))
            .serve_with_shutdown(self.addr, async move {
                shutdown.cancelled().await;
                tracing::info!("dispatch API server draining");
            })
            .await
    }
}
