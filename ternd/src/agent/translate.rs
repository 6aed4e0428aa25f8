use std::net::IpAddr;
use std::str::FromStr;

use ipnet::IpNet;

use tern_proto::tern::{AttachResult, CniResult, IpConf, RouteConf};

use super::error::Error;

/// Validates a backend attach result and shapes it into the response
/// returned to the plugin. Addresses must be in CIDR notation and every
/// address must reference an interface present in the result.
pub fn to_cni_result(res: &AttachResult) -> Result<CniResult, Error> {
    let mut ips = Vec::with_capacity(res.ips.len());
    for ip in res.ips.iter() {
        ips.push(validate_ip_conf(ip, res.interfaces.len())?);
    }
    let mut routes = Vec::with_capacity(res.routes.len());
    for route in res.routes.iter() {
        routes.push(validate_route(route)?);
    }
    Ok(CniResult {
        cni_version: res.cni_version.clone(),
        interfaces: res.interfaces.clone(),
        ips,
        routes,
        dns: res.dns.clone(),
    })
}

pub fn to_attach_result(res: &CniResult) -> AttachResult {
    AttachResult {
        cni_version: res.cni_version.clone(),
        interfaces: res.interfaces.clone(),
        ips: res.ips.clone(),
        routes: res.routes.clone(),
        dns: res.dns.clone(),
    }
}

fn validate_ip_conf(ip: &IpConf, interfaces: usize) -> Result<IpConf, Error> {
    let addr =
        IpNet::from_str(&ip.address).map_err(|_| Error::MalformedAddress(ip.address.clone()))?;
    let index = ip.interface as usize;
    if index >= interfaces {
        return Err(Error::DanglingReference {
            index,
            count: interfaces,
        });
    }
    if !ip.gateway.is_empty() {
        IpAddr::from_str(&ip.gateway).map_err(|_| Error::MalformedAddress(ip.gateway.clone()))?;
    }
    let version = match addr {
        IpNet::V4(_) => "4",
        IpNet::V6(_) => "6",
    };
    Ok(IpConf {
        version: version.to_string(),
        interface: ip.interface,
        address: addr.to_string(),
        gateway: ip.gateway.clone(),
    })
}

fn validate_route(route: &RouteConf) -> Result<RouteConf, Error> {
    IpNet::from_str(&route.dst).map_err(|_| Error::MalformedAddress(route.dst.clone()))?;
    if !route.gw.is_empty() {
        IpAddr::from_str(&route.gw).map_err(|_| Error::MalformedAddress(route.gw.clone()))?;
    }
    Ok(route.clone())
}
