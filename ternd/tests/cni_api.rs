use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use hyper::Body;
use k8s_openapi::api::core::v1::Pod;
use kube::core::ObjectMeta;
use kube::Client;
use serde::Deserialize;
use tokio::net::UnixStream;
use tonic::transport::{Endpoint, Uri};
use tower::service_fn;

use tern_proto::tern::cni_api_client::CniApiClient;
use tern_proto::tern::{
    Args, AttachRequest, AttachResult, DetachRequest, Interface, IpConf,
};

use ternd::agent::backend::Backend;
use ternd::agent::error::Error;
use ternd::agent::identity::VM_UID_ANNOTATION;
use ternd::agent::server::{self, CniServer};

#[derive(Debug, Deserialize)]
struct CniError {
    code: u32,
    #[allow(dead_code)]
    msg: String,
    #[allow(dead_code)]
    details: String,
}

struct StaticBackend {
    results: HashMap<String, AttachResult>,
}

#[tonic::async_trait]
impl Backend for StaticBackend {
    async fn attach(&self, req: AttachRequest) -> Result<AttachResult, Error> {
        self.results
            .get(&req.container_id)
            .cloned()
            .ok_or(Error::Backend(tonic::Status::not_found(req.container_id)))
    }

    async fn detach(&self, _req: DetachRequest) -> Result<(), Error> {
        Ok(())
    }
}

fn test_pod(name: &str, namespace: &str, uid: &str, vm_uid: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            uid: Some(uid.to_string()),
            annotations: Some(BTreeMap::from([(
                VM_UID_ANNOTATION.to_string(),
                vm_uid.to_string(),
            )])),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn mock_kube_client(pods: Vec<Pod>) -> Client {
    let (mock_service, mut handle) =
        tower_test::mock::pair::<http::Request<Body>, http::Response<Body>>();
    tokio::spawn(async move {
        while let Some((request, send)) = handle.next_request().await {
            let path = request.uri().path().to_string();
            let found = pods.iter().find(|p| {
                path == format!(
                    "/api/v1/namespaces/{}/pods/{}",
                    p.metadata.namespace.as_deref().unwrap_or_default(),
                    p.metadata.name.as_deref().unwrap_or_default()
                )
            });
            match found {
                Some(pod) => send.send_response(
                    http::Response::builder()
                        .body(Body::from(serde_json::to_vec(pod).unwrap()))
                        .unwrap(),
                ),
                None => send.send_response(
                    http::Response::builder()
                        .status(http::StatusCode::NOT_FOUND)
                        .body(Body::from(
                            r#"{"kind":"Status","apiVersion":"v1","metadata":{},"status":"Failure","message":"not found","reason":"NotFound","code":404}"#,
                        ))
                        .unwrap(),
                ),
            }
        }
    });
    Client::new(mock_service, "default")
}

async fn uds_client(path: &str) -> CniApiClient<tonic::transport::Channel> {
    let path = path.to_string();
    let channel = Endpoint::try_from("http://[::]:50051")
        .unwrap()
        .connect_with_connector(service_fn(move |_: Uri| UnixStream::connect(path.clone())))
        .await
        .unwrap();
    CniApiClient::new(channel)
}

fn test_args(container_id: &str, namespace: &str, name: &str) -> Args {
    Args {
        container_id: container_id.to_string(),
        netns: format!("/var/run/netns/{container_id}"),
        ifname: "eth0".to_string(),
        path: vec!["/opt/cni/bin".to_string()],
        args: format!(
            "IgnoreUnknown=1;K8S_POD_NAMESPACE={namespace};K8S_POD_NAME={name};K8S_POD_INFRA_CONTAINER_ID={container_id}"
        ),
        config: Vec::new(),
    }
}

#[tokio::test]
async fn cni_api_over_unix_domain_socket() {
    let sock_dir = std::env::temp_dir().join("ternd-test-cni-api");
    let _ = std::fs::remove_dir_all(&sock_dir);
    let sock_path = sock_dir.join("cni.sock");
    let endpoint = sock_path.to_str().unwrap().to_string();

    let client = mock_kube_client(vec![test_pod("web-1", "default", "pod-uid-1", "vm-42")]);
    let backend = Arc::new(StaticBackend {
        results: HashMap::from([(
            "abc123".to_string(),
            AttachResult {
                cni_version: "1.0.0".to_string(),
                interfaces: vec![Interface {
                    name: "eth0".to_string(),
                    mac: "02:42:ac:11:00:02".to_string(),
                    sandbox: "/var/run/netns/abc123".to_string(),
                }],
                ips: vec![IpConf {
                    version: "4".to_string(),
                    interface: 0,
                    address: "10.0.0.5/24".to_string(),
                    gateway: "10.0.0.1".to_string(),
                }],
                routes: Vec::new(),
                dns: None,
            },
        )]),
    });
    let server = CniServer::new(client, backend, Duration::from_secs(10));

    let serve_endpoint = endpoint.clone();
    tokio::spawn(async move {
        server::serve(&serve_endpoint, server).await;
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut client = uds_client(&endpoint).await;

    let res = client
        .add(test_args("abc123", "default", "web-1"))
        .await
        .unwrap();
    let result = res.get_ref();
    assert_eq!(result.interfaces.len(), 1);
    assert_eq!(result.ips[0].interface, 0);
    assert_eq!(result.ips[0].address, "10.0.0.5/24");

    // Backend rejects the unknown container and the failure arrives as a
    // structured CNI error in the status details.
    let status = client
        .add(test_args("unknown", "default", "web-1"))
        .await
        .unwrap_err();
    let detail: CniError = serde_json::from_slice(status.details()).unwrap();
    assert_eq!(detail.code, 220);

    client
        .del(test_args("abc123", "default", "web-1"))
        .await
        .unwrap();
    client
        .check(test_args("abc123", "default", "web-1"))
        .await
        .unwrap();
}
