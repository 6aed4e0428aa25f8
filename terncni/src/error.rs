pub(crate) const ERROR_CODE_GRPC: u32 = 100;
pub(crate) const ERROR_CODE_TIMEOUT: u32 = 110;

pub(crate) const ERROR_MSG_GRPC: &str = "Failed to connect gRPC server";
pub(crate) const ERROR_MSG_TIMEOUT: &str = "Timeout for request";
