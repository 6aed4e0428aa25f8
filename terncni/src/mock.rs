use std::{collections::HashMap, sync::Mutex};

use bytes::Bytes;

use tonic::{Request, Response, Status};

use crate::proto::{
    tern::{self, CniResult},
    CNIErrorDetail,
};

const MOCK_ERROR_CODE_NOT_EXIST: u32 = 3;
const MOCK_ERROR_CODE_BACKEND: u32 = 220;

#[derive(Debug, Clone)]
pub(super) struct MockContainer {
    pub(super) cni_result: CniResult,
    pub(super) add: bool,
    pub(super) del: bool,
    pub(super) check: u32,
}

pub(super) struct MockCNIApiServer {
    containers: Mutex<HashMap<String, MockContainer>>,
}

impl MockCNIApiServer {
    pub(super) fn new(containers: HashMap<String, MockContainer>) -> MockCNIApiServer {
        MockCNIApiServer {
            containers: Mutex::new(containers),
        }
    }
}

fn not_found_status(container_id: &str) -> Status {
    let e = serde_json::to_vec(&CNIErrorDetail {
        code: MOCK_ERROR_CODE_NOT_EXIST,
        msg: rscni::error::Error::NotExist(String::new()).to_string(),
        details: format!("{container_id} is not found"),
    })
    .unwrap();
    Status::with_details(
        tonic::Code::NotFound,
        "Container is not found",
        Bytes::from(e),
    )
}

#[tonic::async_trait]
impl tern::cni_api_server::CniApi for MockCNIApiServer {
    async fn add(&self, req: Request<tern::Args>) -> Result<Response<CniResult>, Status> {
        let container_id = req.get_ref().container_id.clone();
        let mut c = self.containers.lock().unwrap();
        let container = match c.get_mut(&container_id) {
            Some(container) => container,
            None => return Err(not_found_status(&container_id)),
        };
        if container.add {
            let e = serde_json::to_vec(&CNIErrorDetail {
                code: MOCK_ERROR_CODE_BACKEND,
                msg: "Backend error".to_string(),
                details: format!("{container_id} is already attached"),
            })
            .unwrap();
            Err(Status::with_details(
                tonic::Code::Aborted,
                "request aborted",
                Bytes::from(e),
            ))
        } else {
            container.add = true;
            Ok(Response::new(container.cni_result.clone()))
        }
    }

    async fn del(&self, req: Request<tern::Args>) -> Result<Response<CniResult>, Status> {
        let container_id = req.get_ref().container_id.clone();
        let mut c = self.containers.lock().unwrap();
        // Delete is idempotent, an unknown container is still a success.
        match c.get_mut(&container_id) {
            Some(container) => {
                container.del = true;
                Ok(Response::new(CniResult::default()))
            }
            None => Ok(Response::new(CniResult::default())),
        }
    }

    async fn check(&self, req: Request<tern::Args>) -> Result<Response<CniResult>, Status> {
        let container_id = req.get_ref().container_id.clone();
        let mut c = self.containers.lock().unwrap();
        let container = match c.get_mut(&container_id) {
            Some(container) => container,
            None => return Err(not_found_status(&container_id)),
        };
        container.check += 1;
        Ok(Response::new(container.cni_result.clone()))
    }
}
