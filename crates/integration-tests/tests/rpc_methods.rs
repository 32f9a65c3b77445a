//! JSON-RPC methods dispatched through the registered module

use std::sync::Arc;
use std::time::Duration;

use hostctl_api_rpc::{RpcServer, RpcServerConfig, RpcServices};
use hostctl_core::application::{
    AlertEvaluator, AuditLog, CommandExecutor, MetricsSampler, ProcessRegistry, SnapshotCache,
};
use hostctl_core::domain::MetricsSnapshot;
use hostctl_core::port::command_runner::mocks::MockCommandRunner;
use hostctl_core::port::process_terminator::mocks::MockTerminator;
use hostctl_core::port::time_provider::SystemTimeProvider;
use hostctl_core::port::TimeProvider;
use hostctl_infra_system::SysinfoHostQuery;
use jsonrpsee::core::traits::ToRpcParams;
use jsonrpsee::RpcModule;
use serde_json::value::RawValue;
use serde_json::{json, Value};

/// Named (object) params for `RpcModule::call`
struct Named(Value);

impl ToRpcParams for Named {
    fn to_rpc_params(self) -> Result<Option<Box<RawValue>>, serde_json::Error> {
        serde_json::value::to_raw_value(&self.0).map(Some)
    }
}

async fn module() -> (RpcModule<()>, SnapshotCache) {
    let time: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let audit = Arc::new(AuditLog::new(time.clone()));
    let host = Arc::new(SysinfoHostQuery::new());
    let cache = SnapshotCache::new();

    // Pre-fill the cache so metric methods answer without a sampling window
    cache
        .store(MetricsSnapshot {
            cpu_usage_percent: 97.5,
            memory_usage_percent: 12.0,
            ..Default::default()
        })
        .await;

    let services = RpcServices {
        executor: Arc::new(CommandExecutor::new(
            Arc::new(MockCommandRunner::exiting(0, "hello\n")),
            audit.clone(),
            time.clone(),
        )),
        registry: Arc::new(ProcessRegistry::new(
            host.clone(),
            Arc::new(MockTerminator::succeeding()),
            audit.clone(),
        )),
        sampler: Arc::new(
            MetricsSampler::new(host, time.clone()).with_window(Duration::from_millis(10)),
        ),
        alerts: Arc::new(AlertEvaluator::new(time)),
        audit,
        cache: cache.clone(),
    };

    let module = RpcServer::new(RpcServerConfig::default(), services)
        .module()
        .unwrap();
    (module, cache)
}

#[tokio::test]
async fn test_every_method_is_registered() {
    let (module, _) = module().await;
    let names: Vec<&str> = module.method_names().collect();

    for method in [
        "command.execute.v1",
        "process.list.v1",
        "process.details.v1",
        "process.kill.v1",
        "process.search.v1",
        "audit.list.v1",
        "audit.clear.v1",
        "metrics.sample.v1",
        "metrics.info.v1",
        "metrics.dashboard.v1",
        "alerts.evaluate.v1",
        "alerts.history.v1",
        "alerts.clear.v1",
        "alerts.thresholds.get.v1",
        "alerts.thresholds.set.v1",
    ] {
        assert!(names.contains(&method), "{} not registered", method);
    }
}

#[tokio::test]
async fn test_execute_then_audit_list() {
    let (module, _) = module().await;

    let result: Value = module
        .call(
            "command.execute.v1",
            Named(json!({ "command": "echo hello", "actor": "alice", "role": "admin" })),
        )
        .await
        .unwrap();
    assert_eq!(result["success"], json!(true));
    assert_eq!(result["exit_code"], json!(0));

    let audit: Value = module
        .call("audit.list.v1", Named(json!({ "limit": 5 })))
        .await
        .unwrap();
    assert_eq!(audit["entries"][0]["actor"], json!("alice"));
    assert_eq!(audit["entries"][0]["action"], json!("echo hello"));
}

#[tokio::test]
async fn test_client_role_is_refused() {
    let (module, _) = module().await;

    let result = module
        .call::<_, Value>(
            "process.kill.v1",
            Named(json!({ "pid": 1, "actor": "dave", "role": "client" })),
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_list_defaults_without_params() {
    let (module, _) = module().await;

    let result: Value = module.call("process.list.v1", Named(json!({}))).await.unwrap();

    let count = result["count"].as_u64().unwrap();
    assert!(count > 0 && count <= 100);
}

#[tokio::test]
async fn test_evaluate_uses_cached_snapshot() {
    let (module, _) = module().await;

    let result: Value = module
        .call("alerts.evaluate.v1", Named(json!({})))
        .await
        .unwrap();

    let alerts = result["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["kind"], json!("CPU"));
    assert_eq!(alerts[0]["severity"], json!("HIGH"));

    let history: Value = module
        .call("alerts.history.v1", Named(json!({})))
        .await
        .unwrap();
    assert_eq!(history["alerts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_thresholds_round_trip() {
    let (module, _) = module().await;

    let updated: Value = module
        .call(
            "alerts.thresholds.set.v1",
            Named(json!({ "memory": 10.0, "actor": "alice", "role": "technician" })),
        )
        .await
        .unwrap();
    assert_eq!(updated["thresholds"]["memory"], json!(10.0));

    let current: Value = module
        .call("alerts.thresholds.get.v1", Named(json!({})))
        .await
        .unwrap();
    assert_eq!(current["thresholds"]["cpu"], json!(80.0));
    assert_eq!(current["thresholds"]["memory"], json!(10.0));
}

#[tokio::test]
async fn test_dashboard_aggregates() {
    let (module, _) = module().await;

    let dashboard: Value = module
        .call("metrics.dashboard.v1", Named(json!({})))
        .await
        .unwrap();

    assert_eq!(dashboard["metrics"]["cpu_usage_percent"], json!(97.5));
    assert!(!dashboard["top_processes"].as_array().unwrap().is_empty());
    assert_eq!(dashboard["alerts"].as_array().unwrap().len(), 1);
    assert!(dashboard["system_info"]["process_count"].as_u64().unwrap() > 0);
}
