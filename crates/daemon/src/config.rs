//! Daemon configuration from `HOSTCTL_*` environment variables

use std::time::Duration;
use tracing::warn;

use hostctl_api_rpc::RpcServerConfig;
use hostctl_core::application::constants::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_POLL_INTERVAL};

pub const ENV_RPC_HOST: &str = "HOSTCTL_RPC_HOST";
pub const ENV_RPC_PORT: &str = "HOSTCTL_RPC_PORT";
pub const ENV_COMMAND_TIMEOUT_SECS: &str = "HOSTCTL_COMMAND_TIMEOUT_SECS";
pub const ENV_POLL_INTERVAL_SECS: &str = "HOSTCTL_POLL_INTERVAL_SECS";
pub const ENV_POLL_EVALUATE_ALERTS: &str = "HOSTCTL_POLL_EVALUATE_ALERTS";

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub rpc: RpcServerConfig,
    pub command_timeout: Duration,
    pub poll_interval: Duration,
    pub poll_evaluate_alerts: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            rpc: RpcServerConfig::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_evaluate_alerts: false,
        }
    }
}

/// Parse `key` if set; malformed values fall back to the default with a warning
fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key = key, value = %raw, "Ignoring malformed configuration value");
                default
            }
        },
        None => default,
    }
}

impl DaemonConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup(ENV_RPC_HOST).unwrap_or(defaults.rpc.host);
        let port = parse_or(&lookup, ENV_RPC_PORT, defaults.rpc.port);

        let timeout_secs = parse_or(
            &lookup,
            ENV_COMMAND_TIMEOUT_SECS,
            defaults.command_timeout.as_secs(),
        );
        let poll_secs = parse_or(&lookup, ENV_POLL_INTERVAL_SECS, defaults.poll_interval.as_secs());

        Self {
            rpc: RpcServerConfig { host, port },
            command_timeout: Duration::from_secs(timeout_secs.max(1)),
            poll_interval: Duration::from_secs(poll_secs.max(1)),
            poll_evaluate_alerts: parse_or(
                &lookup,
                ENV_POLL_EVALUATE_ALERTS,
                defaults.poll_evaluate_alerts,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> DaemonConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DaemonConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.rpc.host, "127.0.0.1");
        assert_eq!(config.command_timeout, Duration::from_secs(30));
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.poll_evaluate_alerts);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            (ENV_RPC_HOST, "0.0.0.0"),
            (ENV_RPC_PORT, "9700"),
            (ENV_COMMAND_TIMEOUT_SECS, "10"),
            (ENV_POLL_EVALUATE_ALERTS, "true"),
        ]);
        assert_eq!(config.rpc.host, "0.0.0.0");
        assert_eq!(config.rpc.port, 9700);
        assert_eq!(config.command_timeout, Duration::from_secs(10));
        assert!(config.poll_evaluate_alerts);
    }

    #[test]
    fn test_malformed_values_fall_back() {
        let config = config(&[(ENV_RPC_PORT, "not-a-port"), (ENV_POLL_INTERVAL_SECS, "0")]);
        assert_eq!(config.rpc.port, RpcServerConfig::default().port);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
    }
}
