use std::{future::Future, pin::Pin, time::Duration};

use rscni::{
    error::Error,
    types::{Args, CNIResult},
};

use crate::{
    config::Config,
    error::{ERROR_CODE_TIMEOUT, ERROR_MSG_TIMEOUT},
    proto::{args_to_wire, connect, error_from_status, result_from_wire, tern},
};

pub fn add(args: Args) -> Pin<Box<dyn Future<Output = Result<CNIResult, Error>>>> {
    let fut = async { inner_add(args).await };
    Box::pin(fut)
}

// The deadline covers connection establishment as well as the RPC itself so
// a daemon that accepts but never answers cannot hang the runtime.
async fn inner_add(args: Args) -> Result<CNIResult, Error> {
    let conf = Config::parse(&args)?;
    let rpc_args = args_to_wire(&args);

    tokio::time::timeout(
        Duration::from_secs(conf.timeout),
        request_add(conf.endpoint, rpc_args),
    )
    .await
    .map_err(|_| {
        Error::Custom(
            ERROR_CODE_TIMEOUT,
            ERROR_MSG_TIMEOUT.to_string(),
            "CNI Add request timeout.".to_string(),
        )
    })?
}

async fn request_add(endpoint: String, rpc_args: tern::Args) -> Result<CNIResult, Error> {
    tracing::debug!(
        endpoint,
        container_id = rpc_args.container_id,
        "Delegate CNI Add"
    );
    let mut client = connect(&endpoint).await?;
    match client.add(rpc_args).await {
        Ok(result) => Ok(result_from_wire(result.get_ref())),
        Err(status) => Err(error_from_status(&status)),
    }
}
