//! `nats-request` CLI entry-point.
//!
//! Available sub-commands:
//! - `run`: execute a flow file.
//! - `validate`: validate a flow file.
//! - `request`: send a single request without writing a flow.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use engine::{validate_flow, Flow, FlowExecutor, NodeRegistry};
use nats_plugin::config::parse_duration;
use nats_plugin::{ConnectionConfig, MessageSource, NatsConnector, Request, RequestNode, REQUEST_TASK_TYPE};
use nodes::{ExecutionContext, LocalStorage};

#[derive(Parser)]
#[command(
    name = "nats-request",
    about = "Send NATS requests from workflow definitions",
    version
)]
struct Cli {
    /// Root directory backing `kestra://` storage URIs.
    #[arg(long, env = "STORAGE_DIR", default_value = "storage", global = true)]
    storage_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a flow definition YAML file.
    Run {
        path: PathBuf,
        /// Flow input as `key=value`; repeatable.
        #[arg(short, long = "input", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
    },
    /// Validate a flow definition YAML file.
    Validate {
        path: PathBuf,
    },
    /// Send one request and print the reply.
    Request {
        #[arg(long, env = "NATS_URL", default_value = "nats://localhost:4222")]
        url: String,
        #[arg(long)]
        subject: String,
        /// Message body, or a JSON `{"headers": ..., "data": ...}` object.
        #[arg(long)]
        from: String,
        #[arg(long, default_value = "5s", value_parser = parse_duration)]
        timeout: Duration,
        #[arg(long, env = "NATS_USERNAME")]
        username: Option<String>,
        #[arg(long, env = "NATS_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long, env = "NATS_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Path to a NATS `.creds` file (JWT and NKey seed).
        #[arg(long, env = "NATS_CREDS")]
        creds: Option<PathBuf>,
    },
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_owned(), v.to_owned()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

/// Every task type this binary can run.
fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    registry.insert(REQUEST_TASK_TYPE.to_owned(), Arc::new(RequestNode::default()));
    registry
}

fn read_creds(path: Option<&Path>) -> anyhow::Result<Option<String>> {
    path.map(|path| {
        std::fs::read_to_string(path)
            .with_context(|| format!("cannot read credentials file {}", path.display()))
    })
    .transpose()
}

fn load_flow(path: &Path) -> anyhow::Result<Flow> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read file {}", path.display()))?;
    Ok(Flow::from_yaml(&source)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let storage = Arc::new(LocalStorage::new(cli.storage_dir));

    match cli.command {
        Command::Run { path, inputs } => {
            let flow = load_flow(&path)?;
            let inputs: Map<String, Value> =
                inputs.into_iter().map(|(k, v)| (k, Value::String(v))).collect();

            let executor = FlowExecutor::new(registry(), storage);
            let result = executor.run(&flow, inputs).await?;
            info!("execution {} finished", result.execution_id);
            println!("{}", serde_json::to_string_pretty(&result.outputs)?);
        }
        Command::Validate { path } => {
            let flow = load_flow(&path)?;
            if let Err(e) = validate_flow(&flow, &registry()) {
                bail!("❌ Validation failed: {e}");
            }
            println!("✅ Flow '{}' is valid ({} task(s)).", flow.id, flow.tasks.len());
        }
        Command::Request { url, subject, from, timeout, username, password, token, creds } => {
            let from: MessageSource = match serde_json::from_str::<Value>(&from) {
                Ok(value @ (Value::Object(_) | Value::Array(_))) => serde_json::from_value(value)?,
                _ => MessageSource::Text(from),
            };
            let task = Request {
                connection: ConnectionConfig {
                    username,
                    password,
                    token,
                    creds: read_creds(creds.as_deref())?,
                    ..ConnectionConfig::new(url)
                },
                subject,
                from,
                request_timeout: timeout,
            };

            let ctx = ExecutionContext::new("cli", Uuid::new_v4(), "request", json!({}), storage);
            let output = task.run(&NatsConnector::default(), &ctx).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
