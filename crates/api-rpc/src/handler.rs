//! RPC Method Handlers
//!
//! Implements the access check and service call behind each JSON-RPC method.

use crate::error::to_rpc_error;
use crate::types::{
    AlertListResponse, AuditListRequest, AuditListResponse, ClearRequest, ClearResponse,
    DashboardResponse, EmptyRequest, EvaluateAlertsRequest, ExecuteCommandRequest,
    KillProcessRequest,
    ListProcessesRequest, ProcessDetailsRequest, ProcessListResponse, Role,
    SearchProcessesRequest, SetThresholdsRequest, ThresholdsResponse,
};
use hostctl_core::application::constants::DEFAULT_PROCESS_LIST_LIMIT;
use hostctl_core::application::{
    AlertEvaluator, AuditLog, CommandExecutor, MetricsSampler, ProcessRegistry, SnapshotCache,
};
use hostctl_core::domain::{
    split_command_line, CommandResult, KillOutcome, MetricsSnapshot, ProcessDescriptor,
    SystemInfo, ThresholdUpdate,
};
use hostctl_core::error::AppError;
use jsonrpsee::types::ErrorObjectOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Services the RPC layer dispatches to
#[derive(Clone)]
pub struct RpcServices {
    pub executor: Arc<CommandExecutor>,
    pub registry: Arc<ProcessRegistry>,
    pub sampler: Arc<MetricsSampler>,
    pub alerts: Arc<AlertEvaluator>,
    pub audit: Arc<AuditLog>,
    pub cache: SnapshotCache,
}

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    services: RpcServices,
}

fn authorize(role: Role, actor: &str, operation: &str) -> Result<(), ErrorObjectOwned> {
    if role.can_operate() {
        return Ok(());
    }

    warn!(actor = %actor, role = ?role, operation = %operation, "Request refused");
    Err(to_rpc_error(AppError::Forbidden(format!(
        "role {:?} may not {}",
        role, operation
    ))))
}

impl RpcHandler {
    pub fn new(services: RpcServices) -> Self {
        Self { services }
    }

    /// Cached snapshot if the poller has produced one, otherwise a fresh sample
    async fn latest_snapshot(&self) -> MetricsSnapshot {
        if let Some(snapshot) = self.services.cache.latest().await {
            return snapshot;
        }

        let snapshot = self.services.sampler.sample().await;
        self.services.cache.store(snapshot.clone()).await;
        snapshot
    }

    /// command.execute.v1
    pub async fn execute_command(
        &self,
        params: ExecuteCommandRequest,
    ) -> Result<CommandResult, ErrorObjectOwned> {
        authorize(params.role, &params.actor, "execute commands")?;

        let argv = match (params.argv, params.command) {
            (Some(argv), _) if !argv.is_empty() => argv,
            (_, Some(command)) => split_command_line(&command),
            _ => Vec::new(),
        };
        if argv.iter().all(|arg| arg.trim().is_empty()) {
            return Err(to_rpc_error(AppError::Validation(
                "command must not be blank".to_string(),
            )));
        }

        let timeout = params.timeout_ms.map(Duration::from_millis);
        Ok(self
            .services
            .executor
            .execute(&argv, &params.actor, timeout)
            .await)
    }

    /// process.list.v1
    pub async fn list_processes(
        &self,
        params: ListProcessesRequest,
    ) -> Result<ProcessListResponse, ErrorObjectOwned> {
        let processes = self
            .services
            .registry
            .list(params.limit)
            .await
            .map_err(to_rpc_error)?;
        Ok(processes.into())
    }

    /// process.details.v1
    pub async fn process_details(
        &self,
        params: ProcessDetailsRequest,
    ) -> Result<ProcessDescriptor, ErrorObjectOwned> {
        self.services
            .registry
            .get_by_pid(params.pid)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!("process {} not found", params.pid)))
            })
    }

    /// process.kill.v1
    pub async fn kill_process(
        &self,
        params: KillProcessRequest,
    ) -> Result<KillOutcome, ErrorObjectOwned> {
        authorize(params.role, &params.actor, "kill processes")?;
        Ok(self.services.registry.kill(params.pid, &params.actor).await)
    }

    /// process.search.v1
    pub async fn search_processes(
        &self,
        params: SearchProcessesRequest,
    ) -> Result<ProcessListResponse, ErrorObjectOwned> {
        let processes = self
            .services
            .registry
            .search_by_name(&params.term)
            .await
            .map_err(to_rpc_error)?;
        Ok(processes.into())
    }

    /// audit.list.v1
    pub async fn audit_list(
        &self,
        params: AuditListRequest,
    ) -> Result<AuditListResponse, ErrorObjectOwned> {
        Ok(AuditListResponse {
            entries: self.services.audit.recent(params.limit),
        })
    }

    /// audit.clear.v1
    pub async fn audit_clear(&self, params: ClearRequest) -> Result<ClearResponse, ErrorObjectOwned> {
        authorize(params.role, &params.actor, "clear the audit log")?;
        Ok(ClearResponse {
            cleared: self.services.audit.clear(),
        })
    }

    /// metrics.sample.v1
    pub async fn metrics_sample(
        &self,
        _params: EmptyRequest,
    ) -> Result<MetricsSnapshot, ErrorObjectOwned> {
        Ok(self.latest_snapshot().await)
    }

    /// metrics.info.v1
    pub async fn metrics_info(&self, _params: EmptyRequest) -> Result<SystemInfo, ErrorObjectOwned> {
        self.services
            .registry
            .system_info()
            .await
            .map_err(to_rpc_error)
    }

    /// metrics.dashboard.v1
    pub async fn dashboard(
        &self,
        _params: EmptyRequest,
    ) -> Result<DashboardResponse, ErrorObjectOwned> {
        let metrics = self.latest_snapshot().await;
        let alerts = self.services.alerts.evaluate(&metrics);

        let top_processes = self
            .services
            .registry
            .list(DEFAULT_PROCESS_LIST_LIMIT)
            .await
            .map_err(to_rpc_error)?;
        let system_info = self
            .services
            .registry
            .system_info()
            .await
            .map_err(to_rpc_error)?;

        Ok(DashboardResponse {
            metrics,
            top_processes,
            alerts,
            system_info,
        })
    }

    /// alerts.evaluate.v1
    pub async fn alerts_evaluate(
        &self,
        params: EvaluateAlertsRequest,
    ) -> Result<AlertListResponse, ErrorObjectOwned> {
        let snapshot = match params.snapshot {
            Some(snapshot) => snapshot,
            None => self.latest_snapshot().await,
        };
        Ok(AlertListResponse {
            alerts: self.services.alerts.evaluate(&snapshot),
        })
    }

    /// alerts.history.v1
    pub async fn alerts_history(
        &self,
        _params: EmptyRequest,
    ) -> Result<AlertListResponse, ErrorObjectOwned> {
        Ok(AlertListResponse {
            alerts: self.services.alerts.history(),
        })
    }

    /// alerts.clear.v1
    pub async fn alerts_clear(&self, params: ClearRequest) -> Result<ClearResponse, ErrorObjectOwned> {
        authorize(params.role, &params.actor, "clear alert history")?;
        Ok(ClearResponse {
            cleared: self.services.alerts.clear_history(),
        })
    }

    /// alerts.thresholds.get.v1
    pub async fn thresholds_get(
        &self,
        _params: EmptyRequest,
    ) -> Result<ThresholdsResponse, ErrorObjectOwned> {
        Ok(ThresholdsResponse {
            thresholds: self.services.alerts.thresholds(),
        })
    }

    /// alerts.thresholds.set.v1
    pub async fn thresholds_set(
        &self,
        params: SetThresholdsRequest,
    ) -> Result<ThresholdsResponse, ErrorObjectOwned> {
        authorize(params.role, &params.actor, "change alert thresholds")?;

        let thresholds = self.services.alerts.set_thresholds(ThresholdUpdate {
            cpu: params.cpu,
            memory: params.memory,
            disk: params.disk,
        });
        Ok(ThresholdsResponse { thresholds })
    }
}
