//! JSON-RPC Server
//!
//! Serves the hostctl methods as JSON-RPC 2.0 over HTTP on TCP.

use crate::handler::{RpcHandler, RpcServices};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9600;

/// RPC Server Configuration
#[derive(Debug, Clone)]
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

/// Register one method whose params are optional and default when absent
fn register<Req, Resp, F, Fut>(
    module: &mut RpcModule<()>,
    name: &'static str,
    handler: &Arc<RpcHandler>,
    call: F,
) -> Result<(), String>
where
    Req: DeserializeOwned + Default + Send + 'static,
    Resp: Serialize + Clone + Send + 'static,
    F: Fn(Arc<RpcHandler>, Req) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Resp, ErrorObjectOwned>> + Send + 'static,
{
    let handler = handler.clone();
    module
        .register_async_method(name, move |params, _, _| {
            let handler = handler.clone();
            let call = call.clone();
            async move {
                debug!(method = name, "RPC call");
                let req: Option<Req> = params.parse()?;
                call(handler, req.unwrap_or_default()).await
            }
        })
        .map_err(|e| e.to_string())?;
    Ok(())
}

impl RpcServer {
    pub fn new(config: RpcServerConfig, services: RpcServices) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(services)),
        }
    }

    /// Build the module with every method registered
    pub fn module(&self) -> Result<RpcModule<()>, String> {
        let mut module = RpcModule::new(());
        let h = &self.handler;

        register(&mut module, "command.execute.v1", h, |h, req| async move {
            h.execute_command(req).await
        })?;

        // Processes
        register(&mut module, "process.list.v1", h, |h, req| async move {
            h.list_processes(req).await
        })?;
        register(&mut module, "process.details.v1", h, |h, req| async move {
            h.process_details(req).await
        })?;
        register(&mut module, "process.kill.v1", h, |h, req| async move {
            h.kill_process(req).await
        })?;
        register(&mut module, "process.search.v1", h, |h, req| async move {
            h.search_processes(req).await
        })?;

        // Audit
        register(&mut module, "audit.list.v1", h, |h, req| async move {
            h.audit_list(req).await
        })?;
        register(&mut module, "audit.clear.v1", h, |h, req| async move {
            h.audit_clear(req).await
        })?;

        // Metrics
        register(&mut module, "metrics.sample.v1", h, |h, req| async move {
            h.metrics_sample(req).await
        })?;
        register(&mut module, "metrics.info.v1", h, |h, req| async move {
            h.metrics_info(req).await
        })?;
        register(&mut module, "metrics.dashboard.v1", h, |h, req| async move {
            h.dashboard(req).await
        })?;

        // Alerts
        register(&mut module, "alerts.evaluate.v1", h, |h, req| async move {
            h.alerts_evaluate(req).await
        })?;
        register(&mut module, "alerts.history.v1", h, |h, req| async move {
            h.alerts_history(req).await
        })?;
        register(&mut module, "alerts.clear.v1", h, |h, req| async move {
            h.alerts_clear(req).await
        })?;
        register(&mut module, "alerts.thresholds.get.v1", h, |h, req| async move {
            h.thresholds_get(req).await
        })?;
        register(&mut module, "alerts.thresholds.set.v1", h, |h, req| async move {
            h.thresholds_set(req).await
        })?;

        Ok(module)
    }

    /// Start the JSON-RPC server
    ///
    /// Binds to the configured host; the default only accepts local
    /// connections.
    pub async fn start(self) -> Result<ServerHandle, String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let module = self.module()?;
        let methods = module.method_names().count();
        let handle = server.start(module);

        info!(methods = methods, "JSON-RPC server started successfully");
        Ok(handle)
    }
}
