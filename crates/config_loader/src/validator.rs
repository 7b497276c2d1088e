//! Configuration validation
//!
//! Rules:
//! - broker host and topic non-empty
//! - queue capacity > 0
//! - retry.max_attempts >= 1, multiplier >= 1.0
//! - sink name non-empty, kind-specific params present

use contracts::{ConfigError, RelayBlueprint, SinkKind};

/// Validate a RelayBlueprint.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ConfigError> {
    validate_broker(blueprint)?;
    validate_queue(blueprint)?;
    validate_retry(blueprint)?;
    validate_sink(blueprint)?;
    Ok(())
}

fn validate_broker(blueprint: &RelayBlueprint) -> Result<(), ConfigError> {
    let broker = &blueprint.broker;

    if broker.host.is_empty() {
        return Err(ConfigError::validation(
            "broker.host",
            "broker host cannot be empty",
        ));
    }

    if broker.topic.is_empty() {
        return Err(ConfigError::validation(
            "broker.topic",
            "topic cannot be empty",
        ));
    }

    if broker.keep_alive_secs == 0 {
        return Err(ConfigError::validation(
            "broker.keep_alive_secs",
            "keep-alive must be > 0",
        ));
    }

    Ok(())
}

fn validate_queue(blueprint: &RelayBlueprint) -> Result<(), ConfigError> {
    if blueprint.queue.capacity == 0 {
        return Err(ConfigError::validation(
            "queue.capacity",
            "queue capacity must be > 0",
        ));
    }
    Ok(())
}

fn validate_retry(blueprint: &RelayBlueprint) -> Result<(), ConfigError> {
    let retry = &blueprint.retry;

    if retry.max_attempts == 0 {
        return Err(ConfigError::validation(
            "retry.max_attempts",
            "delivery needs at least one attempt",
        ));
    }

    if retry.multiplier < 1.0 {
        return Err(ConfigError::validation(
            "retry.multiplier",
            format!("multiplier must be >= 1.0, got {}", retry.multiplier),
        ));
    }

    Ok(())
}

/// Kind-specific sink parameter checks.
///
/// Only presence is checked here; the sink factories validate the
/// values themselves (URL syntax, table identifier).
fn validate_sink(blueprint: &RelayBlueprint) -> Result<(), ConfigError> {
    let sink = &blueprint.sink;

    if sink.name.is_empty() {
        return Err(ConfigError::validation(
            "sink.name",
            "sink name cannot be empty",
        ));
    }

    match sink.sink_type {
        SinkKind::Console => {}
        SinkKind::Database => {
            let has_url = sink.params.contains_key("url");
            let has_discrete =
                sink.params.contains_key("host") && sink.params.contains_key("schema");
            if !has_url && !has_discrete {
                return Err(ConfigError::validation(
                    "sink.params",
                    "database sink needs 'url' or 'host' + 'schema'",
                ));
            }
        }
        SinkKind::Rest => {
            if !sink.params.contains_key("base_url") {
                return Err(ConfigError::validation(
                    "sink.params.base_url",
                    "rest sink needs 'base_url'",
                ));
            }
            if let Some(method) = sink.params.get("method") {
                if method != "get" && method != "post" {
                    return Err(ConfigError::validation(
                        "sink.params.method",
                        format!("method must be 'get' or 'post', got '{method}'"),
                    ));
                }
            }
        }
    }

    Ok(())
}
