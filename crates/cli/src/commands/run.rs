//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(ref host) = args.host {
        info!(host = %host, "Overriding broker host from CLI");
        blueprint.broker.host = host.clone();
    }
    if let Some(port) = args.port {
        info!(port = %port, "Overriding broker port from CLI");
        blueprint.broker.port = port;
    }
    if let Some(ref topic) = args.topic {
        info!(topic = %topic, "Overriding topic from CLI");
        blueprint.broker.topic = topic.clone();
    }

    info!(
        host = %blueprint.broker.host,
        port = blueprint.broker.port,
        topic = %blueprint.broker.topic,
        sink = %blueprint.sink.name,
        sink_type = ?blueprint.sink.sink_type,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        blueprint,
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        buffer_size: if args.buffer_size == 0 {
            None
        } else {
            Some(args.buffer_size)
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    // Create and run pipeline
    let pipeline = Pipeline::new(pipeline_config);
    let shutdown = CancellationToken::new();

    // Setup graceful shutdown handler
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        warn!("Received shutdown signal, stopping pipeline...");
        signal_token.cancel();
    });

    info!("Starting pipeline...");

    let stats = pipeline
        .run(shutdown)
        .await
        .context("Pipeline execution failed")?;

    info!(
        received = stats.counters.received_count,
        delivered = stats.counters.delivered_count,
        duration_secs = stats.duration.as_secs_f64(),
        throughput = format!("{:.2}", stats.throughput()),
        "Pipeline completed"
    );

    // Print detailed statistics
    stats.print_summary();

    info!("MQTT Relay finished");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::RelayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Broker:");
    println!("  Host: {}:{}", blueprint.broker.host, blueprint.broker.port);
    println!("  Topic: {}", blueprint.broker.topic);
    println!("  Keep-alive: {}s", blueprint.broker.keep_alive_secs);
    if !blueprint.broker.username.is_empty() {
        println!("  Username: {}", blueprint.broker.username);
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

    println!("\nSink:");
    println!(
        "  {} ({:?}), {} delivery attempt(s)",
        blueprint.sink.name, blueprint.sink.sink_type, blueprint.retry.max_attempts
    );

    println!();
}
