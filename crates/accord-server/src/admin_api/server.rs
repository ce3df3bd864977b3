//! Admin API server.

use crate::admin_api::router::route_request;
use crate::config::Config;
use crate::contract::ContractCompiler;
use crate::sandbox::{Sandbox, SandboxLimits};
use crate::store::{InMemoryStore, ResourceStore};
use crate::wirestub::WirestubManager;
use crate::wiretest::{HttpWireClient, WiretestRunner};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Everything the admin handlers operate on
pub struct AdminState {
    pub store: Arc<dyn ResourceStore>,
    pub compiler: ContractCompiler,
    pub wirestubs: Arc<WirestubManager>,
    pub wiretests: WiretestRunner,
}

impl AdminState {
    /// Wire an in-memory store, the wirestub manager and the wire-test runner
    /// from configuration.
    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let store = InMemoryStore::shared();
        let compiler = ContractCompiler::new(Sandbox::new(SandboxLimits::from(&config.sandbox)));
        let client = HttpWireClient::new(Duration::from_secs(config.wiretest.timeout_secs))?;
        let wirestubs = Arc::new(WirestubManager::new(Arc::clone(&store), &config.wirestub));
        let wiretests = WiretestRunner::new(
            Arc::clone(&store),
            Arc::new(client),
            compiler.clone(),
            &config.wiretest,
        );
        Ok(Self {
            store,
            compiler,
            wirestubs,
            wiretests,
        })
    }
}

/// Admin API server for Accord
pub struct AdminApiServer {
    addr: SocketAddr,
    state: Arc<AdminState>,
}

impl AdminApiServer {
    /// Create a new admin API server
    pub fn new(addr: SocketAddr, state: Arc<AdminState>) -> Self {
        Self { addr, state }
    }

    /// Run the admin API server
    pub async fn run(self) -> Result<(), anyhow::Error> {
        let listener = TcpListener::bind(self.addr).await?;
        info!("Accord Admin API listening on http://{}", self.addr);
        serve(listener, self.state).await
    }
}

/// Accept admin connections on an already bound listener
pub async fn serve(listener: TcpListener, state: Arc<AdminState>) -> Result<(), anyhow::Error> {
    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = Arc::clone(&state);

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let state = Arc::clone(&state);
                async move { route_request(req, state).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Admin API connection error: {}", e);
            }
        });
    }
}
