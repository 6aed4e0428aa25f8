use k8s_openapi::api::core::v1::Pod;
use kube::{Api, Client, ResourceExt};

use super::error::Error;

pub const VM_UID_ANNOTATION: &str = "tern.dev/vm-uuid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodIdentity {
    pub name: String,
    pub namespace: String,
    pub uid: String,
    pub vm_uid: String,
}

impl PodIdentity {
    pub fn from_pod(name: &str, namespace: &str, pod: &Pod) -> Result<PodIdentity, Error> {
        let uid = pod
            .uid()
            .ok_or_else(|| Error::MissingField(format!("pod {namespace}/{name} has no uid")))?;
        let vm_uid = pod
            .annotations()
            .get(VM_UID_ANNOTATION)
            .cloned()
            .ok_or_else(|| Error::MissingAnnotation(format!("{namespace}/{name}")))?;
        Ok(PodIdentity {
            name: name.to_string(),
            namespace: namespace.to_string(),
            uid,
            vm_uid,
        })
    }
}

// kube::Client has no Debug impl, so Resolver cannot derive it either.
#[derive(Clone)]
pub struct Resolver {
    client: Client,
}

impl Resolver {
    pub fn new(client: Client) -> Resolver {
        Resolver { client }
    }

    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, namespace: &str, name: &str) -> Result<PodIdentity, Error> {
        let pod_api = Api::<Pod>::namespaced(self.client.clone(), namespace);
        let pod = pod_api.get(name).await.map_err(|e| match e {
            kube::Error::Api(ref resp) if resp.code == 404 => {
                Error::PodNotFound(format!("{namespace}/{name}"))
            }
            e => Error::KubeUnavailable(e),
        })?;
        PodIdentity::from_pod(name, namespace, &pod)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use kube::core::ObjectMeta;

    use super::*;

    fn pod(uid: Option<&str>, vm_uid: Option<&str>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("web-1".to_string()),
                namespace: Some("default".to_string()),
                uid: uid.map(|u| u.to_string()),
                annotations: vm_uid.map(|v| {
                    BTreeMap::from([(VM_UID_ANNOTATION.to_string(), v.to_string())])
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn from_pod_extracts_identity() {
        let identity =
            PodIdentity::from_pod("web-1", "default", &pod(Some("pod-uid-1"), Some("vm-42")))
                .unwrap();
        assert_eq!(
            identity,
            PodIdentity {
                name: "web-1".to_string(),
                namespace: "default".to_string(),
                uid: "pod-uid-1".to_string(),
                vm_uid: "vm-42".to_string(),
            }
        );
    }

    #[test]
    fn from_pod_requires_annotation() {
        let res = PodIdentity::from_pod("web-1", "default", &pod(Some("pod-uid-1"), None));
        assert!(matches!(res, Err(Error::MissingAnnotation(_))));
    }

    #[test]
    fn from_pod_requires_uid() {
        let res = PodIdentity::from_pod("web-1", "default", &pod(None, Some("vm-42")));
        assert!(matches!(res, Err(Error::MissingField(_))));
    }
}
