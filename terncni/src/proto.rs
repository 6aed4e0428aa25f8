use rscni::{
    error::Error,
    types::{Args, CNIResult, Dns, Interface, IpConfig, Route},
};
use serde::{Deserialize, Serialize};
use tokio::net::UnixStream;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;

use crate::error::{ERROR_CODE_GRPC, ERROR_MSG_GRPC};

pub use tern_proto::tern;

// Endpoints starting with a slash are Unix domain sockets. The URI given to
// the endpoint builder is never resolved in that case, the connector ignores
// it and dials the socket path instead.
pub async fn connect(
    endpoint: &str,
) -> Result<tern::cni_api_client::CniApiClient<Channel>, Error> {
    let channel = if endpoint.starts_with('/') {
        let path = endpoint.to_string();
        Endpoint::try_from("http://[::]:50051")
            .map_err(grpc_error)?
            .connect_with_connector(service_fn(move |_: Uri| UnixStream::connect(path.clone())))
            .await
            .map_err(grpc_error)?
    } else {
        Endpoint::try_from(endpoint.to_string())
            .map_err(grpc_error)?
            .connect()
            .await
            .map_err(grpc_error)?
    };
    Ok(tern::cni_api_client::CniApiClient::new(channel))
}

fn grpc_error(e: tonic::transport::Error) -> Error {
    Error::Custom(ERROR_CODE_GRPC, ERROR_MSG_GRPC.to_string(), e.to_string())
}

pub(crate) fn error_from_status(status: &tonic::Status) -> Error {
    match serde_json::from_slice::<CNIErrorDetail>(status.details()) {
        Ok(detail) => Error::from(&detail),
        Err(_) => Error::Custom(
            ERROR_CODE_GRPC,
            ERROR_MSG_GRPC.to_string(),
            status.message().to_string(),
        ),
    }
}

pub(crate) fn args_to_wire(args: &Args) -> tern::Args {
    tern::Args {
        container_id: args.container_id.clone(),
        netns: args
            .netns
            .clone()
            .and_then(|netns| netns.as_os_str().to_str().map(|s| s.to_string()))
            .unwrap_or_default(),
        ifname: args.ifname.clone(),
        path: args
            .path
            .iter()
            .filter_map(|p| p.as_os_str().to_str().map(|s| s.to_string()))
            .collect(),
        args: args.args.clone().unwrap_or_default(),
        config: args
            .config
            .as_ref()
            .and_then(|c| serde_json::to_vec(c).ok())
            .unwrap_or_default(),
    }
}

pub(crate) fn result_from_wire(res: &tern::CniResult) -> CNIResult {
    CNIResult {
        interfaces: res.interfaces.iter().map(interface_from_wire).collect(),
        ips: res.ips.iter().map(ip_conf_from_wire).collect(),
        routes: res.routes.iter().map(route_from_wire).collect(),
        dns: res.dns.as_ref().map(dns_from_wire),
    }
}

fn interface_from_wire(iface: &tern::Interface) -> Interface {
    Interface {
        name: iface.name.clone(),
        mac: iface.mac.clone(),
        sandbox: if iface.sandbox.is_empty() {
            None
        } else {
            Some(iface.sandbox.clone())
        },
    }
}

// Interface indices are positional, index 0 is a valid reference to the first
// interface in the list.
fn ip_conf_from_wire(ip: &tern::IpConf) -> IpConfig {
    IpConfig {
        interface: Some(ip.interface),
        address: ip.address.clone(),
        gateway: if ip.gateway.is_empty() {
            None
        } else {
            Some(ip.gateway.clone())
        },
    }
}

fn route_from_wire(route: &tern::RouteConf) -> Route {
    Route {
        dst: route.dst.clone(),
        gw: if route.gw.is_empty() {
            None
        } else {
            Some(route.gw.clone())
        },
        mtu: None,
        advmss: None,
    }
}

fn dns_from_wire(dns: &tern::Dns) -> Dns {
    Dns {
        nameservers: dns.nameservers.clone(),
        domain: if dns.domain.is_empty() {
            None
        } else {
            Some(dns.domain.clone())
        },
        search: if dns.search.is_empty() {
            None
        } else {
            Some(dns.search.clone())
        },
        options: if dns.options.is_empty() {
            None
        } else {
            Some(dns.options.clone())
        },
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct CNIErrorDetail {
    pub(crate) code: u32,
    pub(crate) msg: String,
    pub(crate) details: String,
}

impl From<&CNIErrorDetail> for Error {
    fn from(res: &CNIErrorDetail) -> Self {
        if res.code > 100 {
            return Error::Custom(res.code, res.msg.clone(), res.details.clone());
        }
        match res.code {
            1 => Error::IncompatibleVersion(res.details.clone()),
            2 => Error::UnsupportedNetworkConfiguration(res.details.clone()),
            3 => Error::NotExist(res.details.clone()),
            4 => Error::InvalidEnvValue(res.details.clone()),
            5 => Error::IOFailure(res.details.clone()),
            6 => Error::FailedToDecode(res.details.clone()),
            7 => Error::InvalidNetworkConfig(res.details.clone()),
            11 => Error::TryAgainLater(res.details.clone()),
            _ => Error::FailedToDecode(format!("unknown error code: {}", res.code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;

    use rscni::types::NetConf;

    use super::*;

    #[test]
    fn args_round_trip_to_wire() {
        let args = Args {
            container_id: "abc123".to_string(),
            netns: Some(PathBuf::from("/var/run/netns/abc123")),
            ifname: "eth0".to_string(),
            args: Some("IgnoreUnknown=1;K8S_POD_NAMESPACE=default;K8S_POD_NAME=web-1".to_string()),
            path: vec![PathBuf::from("/opt/cni/bin")],
            config: Some(NetConf {
                custom: HashMap::from([(
                    "endpoint".to_string(),
                    serde_json::json!("/var/run/tern/cni.sock"),
                )]),
                ..Default::default()
            }),
            ..Default::default()
        };

        let wire = args_to_wire(&args);
        assert_eq!(wire.container_id, "abc123");
        assert_eq!(wire.netns, "/var/run/netns/abc123");
        assert_eq!(wire.ifname, "eth0");
        assert_eq!(
            wire.args,
            "IgnoreUnknown=1;K8S_POD_NAMESPACE=default;K8S_POD_NAME=web-1"
        );
        assert_eq!(wire.path, vec!["/opt/cni/bin".to_string()]);

        let conf: NetConf = serde_json::from_slice(&wire.config).unwrap();
        assert_eq!(
            conf.custom.get("endpoint"),
            Some(&serde_json::json!("/var/run/tern/cni.sock"))
        );
    }

    #[test]
    fn ip_conf_keeps_zero_interface_index() {
        let wire = tern::IpConf {
            version: "4".to_string(),
            interface: 0,
            address: "10.0.0.5/24".to_string(),
            gateway: "10.0.0.1".to_string(),
        };
        let ip = ip_conf_from_wire(&wire);
        assert_eq!(ip.interface, Some(0));
        assert_eq!(ip.address, "10.0.0.5/24");
        assert_eq!(ip.gateway.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn error_detail_maps_standard_and_custom_codes() {
        let not_exist = CNIErrorDetail {
            code: 3,
            msg: "not exist".to_string(),
            details: "default/web-1".to_string(),
        };
        assert!(matches!(Error::from(&not_exist), Error::NotExist(_)));

        let custom = CNIErrorDetail {
            code: 220,
            msg: "Backend error".to_string(),
            details: "attach failed".to_string(),
        };
        match Error::from(&custom) {
            Error::Custom(code, _, details) => {
                assert_eq!(code, 220);
                assert_eq!(details, "attach failed");
            }
            other => panic!("Error::Custom is expected, got {:?}", other),
        }
    }

    #[test]
    fn status_without_details_maps_to_grpc_error() {
        let status = tonic::Status::unavailable("connection refused");
        match error_from_status(&status) {
            Error::Custom(code, _, details) => {
                assert_eq!(code, ERROR_CODE_GRPC);
                assert_eq!(details, "connection refused");
            }
            other => panic!("Error::Custom is expected, got {:?}", other),
        }
    }
}
