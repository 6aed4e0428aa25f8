use thiserror::Error;

// Codes above 100 are reserved for plugin custom errors. The daemon uses the
// 200 range so its failures are distinguishable from transport problems
// reported by the plugin itself.
pub(crate) const CNI_ERROR_CODE_TIMEOUT: u32 = 110;
pub(crate) const CNI_ERROR_CODE_KUBE: u32 = 200;
pub(crate) const CNI_ERROR_CODE_INTERNAL: u32 = 210;
pub(crate) const CNI_ERROR_CODE_BACKEND: u32 = 220;
pub(crate) const CNI_ERROR_CODE_TRANSLATION: u32 = 230;
pub(crate) const CNI_ERROR_CODE_ANNOTATION: u32 = 240;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed runtime args: {0}")]
    MalformedArgs(String),

    #[error("pod {0} is not found")]
    PodNotFound(String),

    #[error("pod {0} has no virtual machine annotation")]
    MissingAnnotation(String),

    #[error("kubernetes API is unavailable: {0}")]
    KubeUnavailable(#[source] kube::Error),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("malformed address: {0}")]
    MalformedAddress(String),

    #[error("address references interface {index} but result has {count} interfaces")]
    DanglingReference { index: usize, count: usize },

    #[error("backend request failed: {0}")]
    Backend(#[source] tonic::Status),

    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(#[source] tonic::transport::Error),

    #[error("request deadline exceeded")]
    Timeout,
}

impl From<Error> for rscni::error::Error {
    fn from(err: Error) -> Self {
        use rscni::error::Error as CniError;
        match err {
            Error::MalformedArgs(details) => CniError::InvalidEnvValue(details),
            Error::PodNotFound(details) => CniError::NotExist(details),
            Error::MissingAnnotation(details) => CniError::Custom(
                CNI_ERROR_CODE_ANNOTATION,
                "Missing virtual machine annotation".to_string(),
                details,
            ),
            Error::KubeUnavailable(e) => CniError::Custom(
                CNI_ERROR_CODE_KUBE,
                "Kubernetes error".to_string(),
                e.to_string(),
            ),
            Error::MissingField(details) => CniError::Custom(
                CNI_ERROR_CODE_INTERNAL,
                "Internal error".to_string(),
                details,
            ),
            Error::Backend(status) => CniError::Custom(
                CNI_ERROR_CODE_BACKEND,
                "Backend error".to_string(),
                status.message().to_string(),
            ),
            Error::InvalidEndpoint(e) => CniError::Custom(
                CNI_ERROR_CODE_INTERNAL,
                "Internal error".to_string(),
                e.to_string(),
            ),
            e @ Error::MalformedAddress(_) | e @ Error::DanglingReference { .. } => {
                CniError::Custom(
                    CNI_ERROR_CODE_TRANSLATION,
                    "Translation error".to_string(),
                    e.to_string(),
                )
            }
            e @ Error::Timeout => CniError::Custom(
                CNI_ERROR_CODE_TIMEOUT,
                "Timeout for request".to_string(),
                e.to_string(),
            ),
        }
    }
}
