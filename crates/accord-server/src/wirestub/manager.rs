//! WirestubManager - lifecycle management for per-app stub listeners.
//!
//! At most one listener runs per app id. Creation and deletion are serialized
//! so that a delete returns only after the port has been released.

use super::handler::{handle_stub_request, StubContext};
use super::shutdown::{drain, wait_for_shutdown, ShutdownTrigger};
use super::types::{CreateOutcome, WirestubError};
use crate::config::ListenerConfig;
use crate::metrics;
use crate::store::{ResourceStore, WirestubRecord};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info};

struct RunningWirestub {
    record: WirestubRecord,
    trigger: ShutdownTrigger,
    task: JoinHandle<()>,
}

/// Manages the lifecycle of wirestub listeners
pub struct WirestubManager {
    store: Arc<dyn ResourceStore>,
    /// Active wirestubs by app id
    wirestubs: RwLock<HashMap<String, RunningWirestub>>,
    /// Serializes create/delete so they never interleave on the same port
    lifecycle: Mutex<()>,
    default_host: String,
    shutdown_timeout: Duration,
    max_body_bytes: usize,
}

impl WirestubManager {
    pub fn new(store: Arc<dyn ResourceStore>, config: &ListenerConfig) -> Self {
        Self {
            store,
            wirestubs: RwLock::new(HashMap::new()),
            lifecycle: Mutex::new(()),
            default_host: config.host.clone(),
            shutdown_timeout: Duration::from_millis(config.shutdown_timeout_ms),
            max_body_bytes: config.max_body_bytes,
        }
    }

    pub fn store(&self) -> &Arc<dyn ResourceStore> {
        &self.store
    }

    /// Start a listener for `app_id`, or report the one already running.
    ///
    /// Port `0` binds an OS-assigned port; the returned record carries the
    /// port actually bound.
    pub async fn create(
        &self,
        app_id: &str,
        request: WirestubRecord,
    ) -> Result<CreateOutcome, WirestubError> {
        let _guard = self.lifecycle.lock().await;

        let existing = self.get(app_id).ok();
        if let Some(record) = existing {
            debug!("Wirestub for {} already running on {}", app_id, record.port);
            return Ok(CreateOutcome::AlreadyRunning(record));
        }

        self.store
            .get_app(app_id)
            .map_err(|_| WirestubError::AppNotFound(app_id.to_string()))?;

        let host = request
            .host
            .clone()
            .unwrap_or_else(|| self.default_host.clone());
        let listener = TcpListener::bind((host.as_str(), request.port))
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AddrInUse => WirestubError::PortInUse(request.port),
                _ => WirestubError::BindError(request.port, e.to_string()),
            })?;
        let port = listener
            .local_addr()
            .map_err(|e| WirestubError::BindError(request.port, e.to_string()))?
            .port();

        info!("Wirestub for {} bound to {}:{}", app_id, host, port);

        let ctx = Arc::new(StubContext {
            app_id: app_id.to_string(),
            store: Arc::clone(&self.store),
            max_body_bytes: self.max_body_bytes,
        });
        let (trigger, shutdown_rx) = ShutdownTrigger::new();
        let task = tokio::spawn(serve(listener, ctx, shutdown_rx, self.shutdown_timeout));

        let record = WirestubRecord {
            port,
            host: Some(host),
        };
        self.wirestubs.write().insert(
            app_id.to_string(),
            RunningWirestub {
                record: record.clone(),
                trigger,
                task,
            },
        );
        metrics::wirestub_started();
        Ok(CreateOutcome::Created(record))
    }

    pub fn get(&self, app_id: &str) -> Result<WirestubRecord, WirestubError> {
        self.wirestubs
            .read()
            .get(app_id)
            .map(|running| running.record.clone())
            .ok_or_else(|| WirestubError::NotFound(app_id.to_string()))
    }

    pub fn list(&self) -> Vec<(String, WirestubRecord)> {
        self.wirestubs
            .read()
            .iter()
            .map(|(app_id, running)| (app_id.clone(), running.record.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.wirestubs.read().len()
    }

    /// Stop the listener for `app_id`, waiting for in-flight requests to
    /// drain (bounded by the shutdown timeout). The port is free on return.
    pub async fn delete(&self, app_id: &str) -> Result<WirestubRecord, WirestubError> {
        let _guard = self.lifecycle.lock().await;

        let running = self
            .wirestubs
            .write()
            .remove(app_id)
            .ok_or_else(|| WirestubError::NotFound(app_id.to_string()))?;

        running.trigger.trigger();
        if let Err(e) = running.task.await {
            error!("Wirestub task for {} ended abnormally: {}", app_id, e);
        }
        metrics::wirestub_stopped();

        info!("Wirestub for {} on port {} deleted", app_id, running.record.port);
        Ok(running.record)
    }

    /// Delete every wirestub
    pub async fn shutdown_all(&self) {
        let app_ids: Vec<String> = self.wirestubs.read().keys().cloned().collect();
        for app_id in app_ids {
            let _ = self.delete(&app_id).await;
        }
    }
}

async fn serve(
    listener: TcpListener,
    ctx: Arc<StubContext>,
    mut shutdown_rx: watch::Receiver<bool>,
    shutdown_timeout: Duration,
) {
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, _addr)) => {
                        connections.spawn(serve_connection(
                            stream,
                            Arc::clone(&ctx),
                            shutdown_rx.clone(),
                        ));
                    }
                    Err(e) => {
                        error!("Accept error for wirestub {}: {}", ctx.app_id, e);
                    }
                }
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            _ = wait_for_shutdown(&mut shutdown_rx) => {
                info!("Wirestub for {} shutting down", ctx.app_id);
                break;
            }
        }
    }

    // Release the port before draining so a new listener can bind right away.
    drop(listener);
    drain(&mut connections, shutdown_timeout).await;
}

async fn serve_connection(
    stream: TcpStream,
    ctx: Arc<StubContext>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let io = TokioIo::new(stream);
    let service_ctx = Arc::clone(&ctx);
    let service = service_fn(move |req| {
        let ctx = Arc::clone(&service_ctx);
        async move { handle_stub_request(req, ctx).await }
    });

    let conn = http1::Builder::new().serve_connection(io, service);
    tokio::pin!(conn);

    tokio::select! {
        result = conn.as_mut() => {
            if let Err(e) = result {
                debug!("Connection error on wirestub {}: {}", ctx.app_id, e);
            }
        }
        _ = wait_for_shutdown(&mut shutdown_rx) => {
            conn.as_mut().graceful_shutdown();
            if let Err(e) = conn.as_mut().await {
                debug!("Connection error during shutdown of {}: {}", ctx.app_id, e);
            }
        }
    }
}
