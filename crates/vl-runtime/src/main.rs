//! # Vehicle-Link Runtime
//!
//! Process entry point.
//!
//! ## Startup Sequence
//!
//! 1. Install logging and metrics
//! 2. Load configuration (`VL_CONFIG_FILE`, then `VL_*` overrides)
//! 3. Build the core runtime and start the request sweeper
//! 4. Register and open the CAN bridge when enabled
//! 5. Run until Ctrl+C, then shut down modules, sweeper and pending requests

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use vl_04_can_module::{CanModule, ConnectionState};
use vl_runtime::{CoreRuntime, LoggingSink, RuntimeConfig};
use vl_telemetry::{init_telemetry, TelemetryConfig};

fn load_config() -> Result<RuntimeConfig> {
    let base = match std::env::var("VL_CONFIG_FILE") {
        Ok(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            RuntimeConfig::from_json_str(&text)
                .with_context(|| format!("Failed to parse config file {path}"))?
        }
        Err(_) => RuntimeConfig::default(),
    };

    let config = base
        .with_overrides(|key| std::env::var(key).ok())
        .context("Invalid environment override")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn start_can_module(runtime: &CoreRuntime) -> Result<()> {
    let config = runtime.config();
    let bus = config.tcp_bus_config().context("Invalid CAN settings")?;
    let address = bus.address;
    let module = Arc::new(CanModule::tcp(runtime.context(), bus, config.can_module_config()));

    runtime
        .register_module(module.clone())
        .context("Failed to register CAN module")?;

    let mut state = module.watch_state();
    tokio::spawn(async move {
        while state.changed().await.is_ok() {
            let current = *state.borrow();
            if current == ConnectionState::Closed {
                warn!(address = %address, "CAN bus connection closed");
            } else {
                debug!(address = %address, state = %current, "CAN bus state changed");
            }
        }
    });

    // The module stays registered while closed; its requests fail fast.
    match module.open().await {
        Ok(()) => info!(address = %address, "CAN bus connected"),
        Err(e) => warn!(address = %address, error = %e, "CAN bus unavailable"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialise telemetry")?;

    let config = load_config()?;
    let can_enabled = config.can_module.enabled;

    let runtime = CoreRuntime::new(config, Arc::new(LoggingSink))
        .context("Failed to build core runtime")?;
    runtime.start();

    if can_enabled {
        start_can_module(&runtime).await?;
    }

    info!(modules = runtime.modules().len(), "Vehicle-Link is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;

    if let Some(metrics) = telemetry.metrics() {
        match metrics.render() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(e) => warn!(error = %e, "Failed to render metrics"),
        }
    }

    Ok(())
}
