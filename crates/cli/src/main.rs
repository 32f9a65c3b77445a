//! Hostctl CLI - Command-line interface for the hostctl daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9600";

#[derive(Parser)]
#[command(name = "hostctl")]
#[command(about = "Host process control and telemetry CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "HOSTCTL_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,

    /// Name recorded in the audit log
    #[arg(long, env = "HOSTCTL_ACTOR", default_value = "")]
    actor: String,

    /// Role asserted to the daemon (admin, technician, client)
    ///
    /// Mutating commands (exec, kill, clears, threshold changes) need
    /// admin or technician.
    #[arg(long, env = "HOSTCTL_ROLE", default_value = "client")]
    role: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command on the host
    Exec {
        /// Timeout in seconds (daemon default when omitted)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Program and arguments, passed through unchanged
        #[arg(trailing_var_arg = true, required = true)]
        argv: Vec<String>,
    },

    /// List top processes by cumulative CPU
    Ps {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Show one process
    Show { pid: u32 },

    /// Forcefully terminate a process
    Kill { pid: u32 },

    /// Search processes by name
    Search { term: String },

    /// Show recent audit entries
    Audit {
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,

        /// Clear the audit log instead
        #[arg(long)]
        clear: bool,
    },

    /// Sample hardware metrics
    Metrics,

    /// Show OS information
    Info,

    /// Metrics, top processes, alerts and OS info in one view
    Dashboard,

    /// Evaluate alerts now, or inspect history
    Alerts {
        #[arg(long)]
        history: bool,

        #[arg(long, conflicts_with = "history")]
        clear: bool,
    },

    /// Show or change alert thresholds
    Thresholds {
        #[arg(long)]
        cpu: Option<f64>,

        #[arg(long)]
        memory: Option<f64>,

        #[arg(long)]
        disk: Option<f64>,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

fn display_option(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn display_percent(value: &f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn display_mib(value: &u64) -> String {
    format!("{:.1} MiB", *value as f64 / (1024.0 * 1024.0))
}

#[derive(Deserialize, Tabled)]
struct ProcessRow {
    pid: u32,
    name: String,
    state: String,
    #[tabled(rename = "cpu", display_with = "display_percent")]
    cpu_load_cumulative: f64,
    #[tabled(rename = "rss", display_with = "display_mib")]
    resident_memory_bytes: u64,
    #[tabled(display_with = "display_option")]
    owner: Option<String>,
}

#[derive(Deserialize, Tabled)]
struct AuditRow {
    timestamp: String,
    actor: String,
    action: String,
    success: bool,
}

#[derive(Deserialize, Tabled)]
struct AlertRow {
    timestamp: String,
    kind: String,
    severity: String,
    message: String,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

fn print_processes(result: serde_json::Value) -> Result<()> {
    let rows: Vec<ProcessRow> = serde_json::from_value(result["processes"].clone())?;
    if rows.is_empty() {
        println!("{}", "No processes".yellow());
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

fn print_alerts(alerts: &serde_json::Value) -> Result<()> {
    let rows: Vec<AlertRow> = serde_json::from_value(alerts.clone())?;
    if rows.is_empty() {
        println!("{}", "✓ No alerts".green());
    } else {
        println!("{}", Table::new(rows));
    }
    Ok(())
}

fn print_metrics(metrics: &serde_json::Value) {
    println!("  {} {}", "CPU:".bold(), metrics["cpu_model"]);
    println!(
        "  {} {}% of {} cores",
        "CPU Usage:".bold(),
        metrics["cpu_usage_percent"],
        metrics["cpu_core_count"]
    );
    let total_gib = metrics["total_memory_bytes"].as_u64().unwrap_or(0) as f64 / 1024f64.powi(3);
    println!(
        "  {} {}% of {:.2} GiB",
        "Memory:".bold(),
        metrics["memory_usage_percent"],
        total_gib
    );

    if let Some(disks) = metrics["disks"].as_array() {
        for disk in disks {
            println!("  {} {} {}", "Disk:".bold(), disk["name"], disk["model"]);
        }
    }
    if let Some(interfaces) = metrics["network_interfaces"].as_array() {
        for iface in interfaces {
            println!(
                "  {} {} rx={} tx={}",
                "Net:".bold(),
                iface["display_name"],
                iface["bytes_received"],
                iface["bytes_sent"]
            );
        }
    }
}

fn print_info(info: &serde_json::Value) {
    println!("  {} {}", "OS:".bold(), info["os_name"]);
    println!("  {} {}", "Version:".bold(), info["os_version"]);
    println!("  {} {}", "Kernel:".bold(), info["kernel_version"]);
    println!("  {} {}", "Host:".bold(), info["host_name"]);
    println!("  {} {} seconds", "Uptime:".bold(), info["uptime_secs"]);
    println!("  {} {}", "Processes:".bold(), info["process_count"]);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let url = cli.rpc_url.as_str();

    match cli.command {
        Commands::Exec { timeout, argv } => {
            let params = json!({
                "argv": argv,
                "timeout_ms": timeout.map(|secs| secs * 1000),
                "actor": cli.actor,
                "role": cli.role,
            });

            let result = call_rpc(url, "command.execute.v1", params).await?;

            if let Some(output) = result["output"].as_str() {
                println!("{}", output.trim_end());
            }
            if result["success"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ exit code {}", result["exit_code"]).green().bold());
            } else {
                let reason = result["error"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("exit code {}", result["exit_code"]));
                println!("{}", format!("✗ {}", reason).red().bold());
            }
            if result["output_truncated"].as_bool().unwrap_or(false) {
                println!("{}", "(output truncated)".yellow());
            }
        }

        Commands::Ps { limit } => {
            let result = call_rpc(url, "process.list.v1", json!({ "limit": limit })).await?;
            print_processes(result)?;
        }

        Commands::Show { pid } => {
            let result = call_rpc(url, "process.details.v1", json!({ "pid": pid })).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Commands::Kill { pid } => {
            let params = json!({ "pid": pid, "actor": cli.actor, "role": cli.role });
            let result = call_rpc(url, "process.kill.v1", params).await?;

            let message = result["message"].as_str().unwrap_or_default();
            if result["success"].as_bool().unwrap_or(false) {
                println!("{}", format!("✓ {} {}", pid, message).green().bold());
            } else {
                println!("{}", format!("✗ {} {}", pid, message).red().bold());
            }
        }

        Commands::Search { term } => {
            let result = call_rpc(url, "process.search.v1", json!({ "term": term })).await?;
            print_processes(result)?;
        }

        Commands::Audit { limit, clear } => {
            if clear {
                let params = json!({ "actor": cli.actor, "role": cli.role });
                let result = call_rpc(url, "audit.clear.v1", params).await?;
                println!("{}", format!("✓ {} entries cleared", result["cleared"]).green());
            } else {
                let result = call_rpc(url, "audit.list.v1", json!({ "limit": limit })).await?;
                let rows: Vec<AuditRow> = serde_json::from_value(result["entries"].clone())?;
                println!("{}", Table::new(rows));
            }
        }

        Commands::Metrics => {
            let metrics = call_rpc(url, "metrics.sample.v1", json!({})).await?;
            println!("{}", "System Metrics".cyan().bold());
            print_metrics(&metrics);
        }

        Commands::Info => {
            let info = call_rpc(url, "metrics.info.v1", json!({})).await?;
            println!("{}", "System Info".cyan().bold());
            print_info(&info);
        }

        Commands::Dashboard => {
            let dashboard = call_rpc(url, "metrics.dashboard.v1", json!({})).await?;

            println!("{}", "System Info".cyan().bold());
            print_info(&dashboard["system_info"]);
            println!();
            println!("{}", "Metrics".cyan().bold());
            print_metrics(&dashboard["metrics"]);
            println!();
            println!("{}", "Alerts".cyan().bold());
            print_alerts(&dashboard["alerts"])?;
            println!();
            println!("{}", "Top Processes".cyan().bold());
            let rows: Vec<ProcessRow> =
                serde_json::from_value(dashboard["top_processes"].clone())?;
            println!("{}", Table::new(rows.into_iter().take(10)));
        }

        Commands::Alerts { history, clear } => {
            if clear {
                let params = json!({ "actor": cli.actor, "role": cli.role });
                let result = call_rpc(url, "alerts.clear.v1", params).await?;
                println!("{}", format!("✓ {} alerts cleared", result["cleared"]).green());
            } else {
                let method = if history {
                    "alerts.history.v1"
                } else {
                    "alerts.evaluate.v1"
                };
                let result = call_rpc(url, method, json!({})).await?;
                print_alerts(&result["alerts"])?;
            }
        }

        Commands::Thresholds { cpu, memory, disk } => {
            let result = if cpu.is_none() && memory.is_none() && disk.is_none() {
                call_rpc(url, "alerts.thresholds.get.v1", json!({})).await?
            } else {
                let params = json!({
                    "cpu": cpu,
                    "memory": memory,
                    "disk": disk,
                    "actor": cli.actor,
                    "role": cli.role,
                });
                call_rpc(url, "alerts.thresholds.set.v1", params).await?
            };

            let thresholds = &result["thresholds"];
            println!("  {} {}%", "CPU:".bold(), thresholds["cpu"]);
            println!("  {} {}%", "Memory:".bold(), thresholds["memory"]);
            println!("  {} {}%", "Disk:".bold(), thresholds["disk"]);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_defaults_to_client() {
        let cli = Cli::try_parse_from(["hostctl", "kill", "42"]).unwrap();
        assert_eq!(cli.role, "client");
        assert!(matches!(cli.command, Commands::Kill { pid: 42 }));
    }

    #[test]
    fn test_role_is_explicit_opt_in() {
        let cli = Cli::try_parse_from(["hostctl", "--role", "technician", "kill", "42"]).unwrap();
        assert_eq!(cli.role, "technician");
    }

    #[test]
    fn test_exec_keeps_argv() {
        let cli = Cli::try_parse_from(["hostctl", "exec", "-t", "5", "ls", "-la", "/tmp"]).unwrap();
        match cli.command {
            Commands::Exec { timeout, argv } => {
                assert_eq!(timeout, Some(5));
                assert_eq!(argv, vec!["ls", "-la", "/tmp"]);
            }
            _ => panic!("expected exec"),
        }
    }
}
