use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use kube::Client;
use serde::{Deserialize, Serialize};
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tonic::{async_trait, transport::Server, Request, Response, Status};

use tern_proto::tern::cni_api_server::{CniApi, CniApiServer};
use tern_proto::tern::{Args, AttachRequest, CniResult, DetachRequest};

use crate::config::Config;
use crate::trace::{prepare_tracing, TraceConfig};

use super::backend::{Backend, VRouterBackend};
use super::error::Error;
use super::identity::{PodIdentity, Resolver};
use super::pod::PodInfo;
use super::translate;

/// Stateless CNI delegation server. All attachment state lives in the
/// backend, so requests for distinct containers can run concurrently
/// without coordination.
pub struct CniServer {
    resolver: Resolver,
    backend: Arc<dyn Backend>,
    timeout: Duration,
}

impl CniServer {
    pub fn new(client: Client, backend: Arc<dyn Backend>, timeout: Duration) -> CniServer {
        CniServer {
            resolver: Resolver::new(client),
            backend,
            timeout,
        }
    }

    #[tracing::instrument(skip_all)]
    async fn add(&self, args: &Args) -> Result<CniResult, Error> {
        let pod_info = PodInfo::from_str(&args.args)?;
        tracing::info!(
            name = pod_info.name,
            namespace = pod_info.namespace,
            container_id = args.container_id,
            cmd = "ADD",
            "Resolve pod identity"
        );
        let identity = self
            .resolver
            .resolve(&pod_info.namespace, &pod_info.name)
            .await?;

        tracing::info!(
            name = identity.name,
            namespace = identity.namespace,
            container_id = args.container_id,
            vm_uid = identity.vm_uid,
            cmd = "ADD",
            "Request attach"
        );
        let attach_result = self
            .backend
            .attach(attach_request(args, &identity))
            .await?;

        translate::to_cni_result(&attach_result)
    }

    // Identity resolution is best effort here. Cleanup must proceed even
    // when the pod object is already gone from the cluster API.
    #[tracing::instrument(skip_all)]
    async fn del(&self, args: &Args) -> Result<CniResult, Error> {
        let pod_info = match PodInfo::from_str(&args.args) {
            Ok(info) => Some(info),
            Err(e) => {
                tracing::warn!(
                    container_id = args.container_id,
                    cmd = "DEL",
                    error = %e,
                    "Failed to parse runtime args"
                );
                None
            }
        };

        let identity = match &pod_info {
            Some(info) => match self.resolver.resolve(&info.namespace, &info.name).await {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::warn!(
                        name = info.name,
                        namespace = info.namespace,
                        container_id = args.container_id,
                        cmd = "DEL",
                        error = %e,
                        "Failed to resolve pod identity"
                    );
                    None
                }
            },
            None => None,
        };

        tracing::info!(
            container_id = args.container_id,
            cmd = "DEL",
            "Request detach"
        );
        self.backend
            .detach(detach_request(args, pod_info.as_ref(), identity.as_ref()))
            .await?;

        Ok(CniResult::default())
    }

    #[tracing::instrument(skip_all)]
    async fn check(&self, args: &Args) -> Result<CniResult, Error> {
        let pod_info = PodInfo::from_str(&args.args)?;
        tracing::info!(
            name = pod_info.name,
            namespace = pod_info.namespace,
            container_id = args.container_id,
            cmd = "CHECK",
            "CNI Check is called"
        );
        Ok(CniResult::default())
    }
}

fn attach_request(args: &Args, identity: &PodIdentity) -> AttachRequest {
    AttachRequest {
        container_id: args.container_id.clone(),
        netns: args.netns.clone(),
        ifname: args.ifname.clone(),
        pod_name: identity.name.clone(),
        pod_namespace: identity.namespace.clone(),
        pod_uid: identity.uid.clone(),
        vm_uid: identity.vm_uid.clone(),
    }
}

fn detach_request(
    args: &Args,
    pod_info: Option<&PodInfo>,
    identity: Option<&PodIdentity>,
) -> DetachRequest {
    DetachRequest {
        container_id: args.container_id.clone(),
        netns: args.netns.clone(),
        ifname: args.ifname.clone(),
        pod_name: pod_info.map(|i| i.name.clone()).unwrap_or_default(),
        pod_namespace: pod_info.map(|i| i.namespace.clone()).unwrap_or_default(),
        pod_uid: identity
            .map(|i| i.uid.clone())
            .or_else(|| pod_info.and_then(|i| i.uid.clone()))
            .unwrap_or_default(),
        vm_uid: identity.map(|i| i.vm_uid.clone()).unwrap_or_default(),
    }
}

fn error_status(e: Error) -> Status {
    let cni_err = rscni::error::Error::from(e);
    let error_result = CNIErrorDetail {
        code: u32::from(&cni_err),
        msg: cni_err.to_string(),
        details: cni_err.details(),
    };
    match serde_json::to_vec(&error_result) {
        Ok(v) => Status::with_details(tonic::Code::Internal, "Internal error", Bytes::from(v)),
        Err(e) => Status::internal(e.to_string()),
    }
}

#[async_trait]
impl CniApi for CniServer {
    #[tracing::instrument(skip_all)]
    async fn add(&self, req: Request<Args>) -> Result<Response<CniResult>, Status> {
        let args = req.get_ref();
        match tokio::time::timeout(self.timeout, self.add(args))
            .await
            .unwrap_or(Err(Error::Timeout))
        {
            Ok(res) => Ok(Response::new(res)),
            Err(e) => {
                tracing::error!(container_id = args.container_id, error = %e, "Failed to add");
                Err(error_status(e))
            }
        }
    }

    #[tracing::instrument(skip_all)]
    async fn del(&self, req: Request<Args>) -> Result<Response<CniResult>, Status> {
        let args = req.get_ref();
        match tokio::time::timeout(self.timeout, self.del(args))
            .await
            .unwrap_or(Err(Error::Timeout))
        {
            Ok(res) => Ok(Response::new(res)),
            Err(e) => {
                tracing::error!(container_id = args.container_id, error = %e, "Failed to delete");
                Err(error_status(e))
            }
        }
    }

    #[tracing::instrument(skip_all)]
    async fn check(&self, req: Request<Args>) -> Result<Response<CniResult>, Status> {
        let args = req.get_ref();
        match tokio::time::timeout(self.timeout, self.check(args))
            .await
            .unwrap_or(Err(Error::Timeout))
        {
            Ok(res) => Ok(Response::new(res)),
            Err(e) => {
                tracing::error!(container_id = args.container_id, error = %e, "Failed to check");
                Err(error_status(e))
            }
        }
    }
}

pub fn start(config: Config, trace: TraceConfig) {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(run(config, trace));
}

async fn run(config: Config, trace: TraceConfig) {
    prepare_tracing(trace);

    let client = Client::try_default()
        .await
        .expect("failed to create kubernetes client");
    let backend =
        VRouterBackend::new(&config.vrouter_endpoint).expect("invalid vrouter endpoint");
    let server = CniServer::new(
        client,
        Arc::new(backend),
        Duration::from_secs(config.request_timeout),
    );

    serve(&config.endpoint, server).await;
}

#[tracing::instrument(skip_all)]
pub async fn serve(endpoint: &str, server: CniServer) {
    if endpoint.starts_with('/') {
        let sock_file = Path::new(endpoint);
        if let Some(parent) = sock_file.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        // A stale socket left by a previous run would make bind fail.
        if sock_file.exists() {
            std::fs::remove_file(sock_file).unwrap();
        }
        tracing::info!(endpoint, "CNI server is started with Unix Domain Socket");
        let uds_listener = UnixListener::bind(sock_file).unwrap();
        let uds_stream = UnixListenerStream::new(uds_listener);
        Server::builder()
            .add_service(CniApiServer::new(server))
            .serve_with_incoming(uds_stream)
            .await
            .unwrap();
    } else {
        tracing::info!(endpoint, "CNI server is started with HTTP");
        let sock_addr = endpoint.parse().unwrap();
        Server::builder()
            .add_service(CniApiServer::new(server))
            .serve(sock_addr)
            .await
            .unwrap();
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct CNIErrorDetail {
    code: u32,
    msg: String,
    details: String,
}
