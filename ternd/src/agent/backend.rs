use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

use tern_proto::tern::v_router_api_client::VRouterApiClient;
use tern_proto::tern::{AttachRequest, AttachResult, DetachRequest};

use super::error::Error;

/// Network backend the daemon delegates attach and detach operations to.
#[tonic::async_trait]
pub trait Backend: Send + Sync + 'static {
    async fn attach(&self, req: AttachRequest) -> Result<AttachResult, Error>;
    async fn detach(&self, req: DetachRequest) -> Result<(), Error>;
}

#[derive(Debug, Clone)]
pub struct VRouterBackend {
    client: VRouterApiClient<Channel>,
}

impl VRouterBackend {
    // The channel is lazy so the daemon can come up before the vRouter
    // agent does.
    pub fn new(endpoint: &str) -> Result<VRouterBackend, Error> {
        let channel = if endpoint.starts_with('/') {
            let path = endpoint.to_string();
            Endpoint::try_from("http://[::]:50051")
                .map_err(Error::InvalidEndpoint)?
                .connect_with_connector_lazy(service_fn(move |_: Uri| {
                    UnixStream::connect(path.clone())
                }))
        } else {
            Endpoint::try_from(endpoint.to_string())
                .map_err(Error::InvalidEndpoint)?
                .connect_lazy()
        };
        Ok(VRouterBackend {
            client: VRouterApiClient::new(channel),
        })
    }
}

#[tonic::async_trait]
impl Backend for VRouterBackend {
    async fn attach(&self, req: AttachRequest) -> Result<AttachResult, Error> {
        let mut client = self.client.clone();
        let res = client.attach(req).await.map_err(Error::Backend)?;
        Ok(res.into_inner())
    }

    async fn detach(&self, req: DetachRequest) -> Result<(), Error> {
        let mut client = self.client.clone();
        client.detach(req).await.map_err(Error::Backend)?;
        Ok(())
    }
}
