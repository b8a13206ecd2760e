//! In-process record store used by the integration tests.
//!
//! Serves the generated `RecordService` on an ephemeral port, keeps entries
//! in memory and records what it was sent so tests can inspect requests.

#![allow(dead_code)]

use recordbase_proto::record as pb;
use recordbase_proto::record::record_service_server::{RecordService, RecordServiceServer};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::time::Duration;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

/// Tenant whose writes the fake store refuses.
pub const READ_ONLY_TENANT: &str = "read-only";

#[derive(Debug, Default)]
pub struct StoreState {
    pub entries: Mutex<HashMap<(String, String), pb::GetResponse>>,
    pub updates: Mutex<Vec<pb::UpdateRequest>>,
    /// `authorization` header of every call, in arrival order.
    pub auth_headers: Mutex<Vec<Option<String>>>,
    /// Whether each call carried a `grpc-timeout` header.
    pub grpc_timeouts: Mutex<Vec<bool>>,
    /// Delay every call by this much.
    pub stall: Mutex<Option<Duration>>,
}

impl StoreState {
    pub fn insert(&self, entry: pb::GetResponse) {
        self.entries
            .lock()
            .unwrap()
            .insert((entry.tenant.clone(), entry.primary_key.clone()), entry);
    }

    pub fn set_stall(&self, stall: Duration) {
        *self.stall.lock().unwrap() = Some(stall);
    }

    pub fn update_types(&self) -> Vec<pb::UpdateType> {
        self.updates
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.update_type())
            .collect()
    }

    fn observe<T>(&self, request: &Request<T>) -> Option<Duration> {
        let auth = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.auth_headers.lock().unwrap().push(auth);
        self.grpc_timeouts
            .lock()
            .unwrap()
            .push(request.metadata().get("grpc-timeout").is_some());
        *self.stall.lock().unwrap()
    }
}

#[derive(Debug, Clone)]
pub struct FakeStore {
    pub state: Arc<StoreState>,
}

#[tonic::async_trait]
impl RecordService for FakeStore {
    async fn get(
        &self,
        request: Request<pb::GetRequest>,
    ) -> Result<Response<pb::GetResponse>, Status> {
        if let Some(stall) = self.state.observe(&request) {
            tokio::time::sleep(stall).await;
        }
        let req = request.into_inner();
        let entries = self.state.entries.lock().unwrap();
        let mut entry = entries
            .get(&(req.tenant.clone(), req.primary_key.clone()))
            .cloned()
            .ok_or_else(|| Status::not_found(format!("{}/{}", req.tenant, req.primary_key)))?;
        if !req.file_contents {
            for file in &mut entry.files {
                file.data.clear();
            }
        }
        Ok(Response::new(entry))
    }

    async fn update(
        &self,
        request: Request<pb::UpdateRequest>,
    ) -> Result<Response<pb::UpdateResponse>, Status> {
        if let Some(stall) = self.state.observe(&request) {
            tokio::time::sleep(stall).await;
        }
        let req = request.into_inner();
        if req.tenant == READ_ONLY_TENANT {
            return Err(Status::permission_denied("tenant is read-only"));
        }
        self.state.updates.lock().unwrap().push(req.clone());

        let mut entries = self.state.entries.lock().unwrap();
        let key = (req.tenant.clone(), req.primary_key.clone());
        let previous = entries.remove(&key);
        let version = previous.as_ref().map_or(0, |p| p.version) + 1;

        let next = match (req.update_type(), previous) {
            (pb::UpdateType::Merge, Some(mut stored)) => {
                for attr in req.attributes {
                    stored.attributes.retain(|a| a.name != attr.name);
                    stored.attributes.push(attr);
                }
                for col in req.columns {
                    stored.columns.retain(|c| c.name != col.name);
                    stored.columns.push(col);
                }
                if !req.tags.is_empty() {
                    stored.tags = req.tags;
                }
                stored.version = version;
                stored
            }
            _ => pb::GetResponse {
                tenant: req.tenant,
                primary_key: req.primary_key,
                version,
                attributes: req.attributes,
                tags: req.tags,
                columns: req.columns,
                ..Default::default()
            },
        };
        entries.insert(key, next);
        Ok(Response::new(pb::UpdateResponse {}))
    }
}

/// Start a fake store on an ephemeral port.
pub async fn spawn_store() -> (SocketAddr, Arc<StoreState>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(StoreState::default());
    let store = FakeStore {
        state: state.clone(),
    };

    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(RecordServiceServer::new(store))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    (addr, state)
}

/// Accept connections and never answer, leaving every handshake hanging.
pub async fn spawn_silent_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}
