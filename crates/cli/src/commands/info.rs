//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

use crate::cli::InfoArgs;

/// Parameter keys whose values are redacted in output
const SECRET_PARAMS: &[&str] = &["password", "url"];

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    broker: BrokerInfo,
    reconnect: ReconnectInfo,
    queue: QueueInfo,
    retry: RetryInfo,
    sink: SinkInfo,
}

#[derive(Serialize)]
struct BrokerInfo {
    host: String,
    port: u16,
    topic: String,
    keep_alive_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<String>,
    anonymous: bool,
}

#[derive(Serialize)]
struct ReconnectInfo {
    max_attempts: u32,
    delay_secs: u64,
}

#[derive(Serialize)]
struct QueueInfo {
    capacity: usize,
    drop_policy: String,
}

#[derive(Serialize)]
struct RetryInfo {
    max_attempts: u32,
    initial_backoff_ms: u64,
    multiplier: f64,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::RelayBlueprint, args: &InfoArgs) -> ConfigInfo {
    let params = if args.params {
        redacted_params(blueprint)
    } else {
        BTreeMap::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        broker: BrokerInfo {
            host: blueprint.broker.host.clone(),
            port: blueprint.broker.port,
            topic: blueprint.broker.topic.clone(),
            keep_alive_secs: blueprint.broker.keep_alive_secs,
            client_id: blueprint.broker.client_id.clone(),
            anonymous: blueprint.broker.username.is_empty(),
        },
        reconnect: ReconnectInfo {
            max_attempts: blueprint.reconnect.max_attempts,
            delay_secs: blueprint.reconnect.delay_secs,
        },
        queue: QueueInfo {
            capacity: blueprint.queue.capacity,
            drop_policy: format!("{:?}", blueprint.queue.drop_policy),
        },
        retry: RetryInfo {
            max_attempts: blueprint.retry.max_attempts,
            initial_backoff_ms: blueprint.retry.initial_backoff_ms,
            multiplier: blueprint.retry.multiplier,
        },
        sink: SinkInfo {
            name: blueprint.sink.name.clone(),
            sink_type: format!("{:?}", blueprint.sink.sink_type),
            params,
        },
    }
}

/// Sink params with credential-bearing values masked
fn redacted_params(blueprint: &contracts::RelayBlueprint) -> BTreeMap<String, String> {
    blueprint
        .sink
        .params
        .iter()
        .map(|(k, v)| {
            if SECRET_PARAMS.contains(&k.as_str()) {
                (k.clone(), "<redacted>".to_string())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}

fn print_config_info(blueprint: &contracts::RelayBlueprint, args: &InfoArgs) {
    println!("=== MQTT Relay Configuration ===\n");

    println!("Broker:");
    println!("  Version: {:?}", blueprint.version);
    println!("  Host: {}:{}", blueprint.broker.host, blueprint.broker.port);
    println!("  Topic: {}", blueprint.broker.topic);
    println!("  Keep-alive: {}s", blueprint.broker.keep_alive_secs);
    match &blueprint.broker.client_id {
        Some(id) => println!("  Client ID: {}", id),
        None => println!("  Client ID: (generated)"),
    }
    if blueprint.broker.username.is_empty() {
        println!("  Auth: anonymous");
    } else {
        println!("  Auth: {}", blueprint.broker.username);
    }

    println!("\nReconnect:");
    if blueprint.reconnect.max_attempts == 0 {
        println!("  Attempts: unlimited");
    } else {
        println!("  Attempts: {}", blueprint.reconnect.max_attempts);
    }
    println!("  Delay: {}s", blueprint.reconnect.delay_secs);

    println!("\nQueue:");
    println!("  Capacity: {}", blueprint.queue.capacity);
    println!("  Drop policy: {:?}", blueprint.queue.drop_policy);

    println!("\nRetry:");
    println!("  Attempts per event: {}", blueprint.retry.max_attempts);
    println!(
        "  Backoff: {}ms x{}",
        blueprint.retry.initial_backoff_ms, blueprint.retry.multiplier
    );

    println!("\nSink:");
    println!(
        "  {} ({:?})",
        blueprint.sink.name, blueprint.sink.sink_type
    );
    if args.params {
        for (key, value) in redacted_params(blueprint) {
            println!("    {} = {}", key, value);
        }
    }

    println!();
}
