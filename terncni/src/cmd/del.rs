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

pub fn del(args: Args) -> Pin<Box<dyn Future<Output = Result<CNIResult, Error>>>> {
    let fut = async { inner_del(args).await };
    Box::pin(fut)
}

async fn inner_del(args: Args) -> Result<CNIResult, Error> {
    let conf = Config::parse(&args)?;
    let rpc_args = args_to_wire(&args);

    tokio::time::timeout(
        Duration::from_secs(conf.timeout),
        request_del(conf.endpoint, rpc_args),
    )
    .await
    .map_err(|_| {
        Error::Custom(
            ERROR_CODE_TIMEOUT,
            ERROR_MSG_TIMEOUT.to_string(),
            "CNI Del request timeout.".to_string(),
        )
    })?
}

async fn request_del(endpoint: String, rpc_args: tern::Args) -> Result<CNIResult, Error> {
    tracing::debug!(
        endpoint,
        container_id = rpc_args.container_id,
        "Delegate CNI Del"
    );
    let mut client = connect(&endpoint).await?;
    match client.del(rpc_args).await {
        Ok(result) => Ok(result_from_wire(result.get_ref())),
        Err(status) => Err(error_from_status(&status)),
    }
}
