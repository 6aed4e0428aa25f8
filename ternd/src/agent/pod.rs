use std::collections::HashMap;
use std::str::FromStr;

use super::error::Error;

// K8S_POD_INFRA_CONTAINER_ID=0a6a4b09df59d64e3be5cf662808076fee664447a1c90dd05a5d5588e2cd6b5a;K8S_POD_UID=b0e1fc4a-f842-4ec2-8e23-8c0c8da7b5e5;IgnoreUnknown=1;K8S_POD_NAMESPACE=kube-system;K8S_POD_NAME=coredns-787d4945fb-7xrrd
const K8S_POD_INFRA_CONTAINER_ID: &str = "K8S_POD_INFRA_CONTAINER_ID";
const K8S_POD_UID: &str = "K8S_POD_UID";
const K8S_POD_NAMESPACE: &str = "K8S_POD_NAMESPACE";
const K8S_POD_NAME: &str = "K8S_POD_NAME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    pub container_id: Option<String>,
    pub uid: Option<String>,
    pub namespace: String,
    pub name: String,
}

impl FromStr for PodInfo {
    type Err = Error;

    // Unknown keys are ignored. Malformed pairs and duplicated keys are
    // rejected so a garbled CNI_ARGS string never resolves the wrong pod.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut fields = HashMap::new();
        for kv in s.split(';').filter(|kv| !kv.is_empty()) {
            let (key, value) = kv
                .split_once('=')
                .ok_or_else(|| Error::MalformedArgs(format!("expected KEY=VALUE, got {kv:?}")))?;
            if fields.insert(key.to_string(), value.to_string()).is_some() {
                return Err(Error::MalformedArgs(format!("duplicated key {key}")));
            }
        }

        let name = fields
            .remove(K8S_POD_NAME)
            .ok_or_else(|| Error::MalformedArgs(format!("{K8S_POD_NAME} is not set")))?;
        let namespace = fields
            .remove(K8S_POD_NAMESPACE)
            .ok_or_else(|| Error::MalformedArgs(format!("{K8S_POD_NAMESPACE} is not set")))?;

        Ok(PodInfo {
            container_id: fields.remove(K8S_POD_INFRA_CONTAINER_ID),
            uid: fields.remove(K8S_POD_UID),
            namespace,
            name,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_pod_info_from_str() {
        let s = "K8S_POD_INFRA_CONTAINER_ID=0a6a4b09df59d64e3be5cf662808076fee664447a1c90dd05a5d5588e2cd6b5a;K8S_POD_UID=b0e1fc4a-f842-4ec2-8e23-8c0c8da7b5e5;IgnoreUnknown=1;K8S_POD_NAMESPACE=kube-system;K8S_POD_NAME=coredns-787d4945fb-7xrrd";
        let expected = PodInfo {
            container_id: Some(
                "0a6a4b09df59d64e3be5cf662808076fee664447a1c90dd05a5d5588e2cd6b5a".to_string(),
            ),
            uid: Some("b0e1fc4a-f842-4ec2-8e23-8c0c8da7b5e5".to_string()),
            namespace: "kube-system".to_string(),
            name: "coredns-787d4945fb-7xrrd".to_string(),
        };
        let info = PodInfo::from_str(s).unwrap();
        assert_eq!(expected, info);
    }

    #[test]
    fn test_pod_info_identity_fields_are_optional() {
        let s = "K8S_POD_NAMESPACE=default;K8S_POD_NAME=web-1";
        let info = PodInfo::from_str(s).unwrap();
        assert_eq!(info.name, "web-1");
        assert_eq!(info.namespace, "default");
        assert_eq!(info.container_id, None);
        assert_eq!(info.uid, None);
    }

    #[rstest(
        s,
        case(""),
        case("K8S_POD_NAMESPACE=default"),
        case("K8S_POD_NAME=web-1"),
        case("K8S_POD_NAMESPACE=default;K8S_POD_NAME=web-1;K8S_POD_NAME=web-2"),
        case("K8S_POD_NAMESPACE=default;garbage;K8S_POD_NAME=web-1")
    )]
    fn test_pod_info_from_str_error(s: &str) {
        let res = PodInfo::from_str(s);
        assert!(matches!(res, Err(Error::MalformedArgs(_))));
    }

    #[test]
    fn test_pod_info_value_may_contain_equal_sign() {
        let s = "K8S_POD_NAMESPACE=default;K8S_POD_NAME=web-1;EXTRA=a=b";
        let info = PodInfo::from_str(s).unwrap();
        assert_eq!(info.name, "web-1");
    }
}
