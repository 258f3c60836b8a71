// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use fragment_distributor::config::consts::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use fragment_distributor::config::{load_config, RuntimeBuilder};
use fragment_distributor::distribution::DistributionManager;
use fragment_distributor::observability::init_tracing;
use fragment_distributor::registry::ExecutionLocation;

fn usage(program: &str) {
    eprintln!("Usage: {} execute <fragment_id> <function_name> [json_param ...]", program);
    eprintln!("       {} place <fragment_id> <local|remote>", program);
    eprintln!("       {} status", program);
    eprintln!();
    eprintln!("Config file: ${} (default {})", CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH);
    eprintln!("Example: {} execute sum_fragment sum 1 2", program);
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("info");

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("fragment-distributor");
    let Some(command) = args.get(1) else {
        usage(program);
        std::process::exit(1);
    };

    let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)
        .with_context(|| format!("loading configuration from '{}'", config_path))?;
    let manager = RuntimeBuilder::from_config(&config)
        .await
        .context("starting the distribution runtime")?;

    let outcome = match command.as_str() {
        "execute" => execute(&manager, &args[2..]).await,
        "place" => place(&manager, &args[2..]).await,
        "status" => status(&manager).await,
        other => {
            usage(program);
            Err(anyhow::anyhow!("unknown command '{}'", other))
        }
    };

    manager.shutdown().await.context("persisting placements")?;
    outcome
}

async fn execute(manager: &DistributionManager, args: &[String]) -> Result<()> {
    let [fragment_id, function_name, params @ ..] = args else {
        bail!("execute needs <fragment_id> <function_name>");
    };

    // Arguments that are not valid JSON are passed as strings.
    let parameters: Vec<Value> = params
        .iter()
        .map(|p| serde_json::from_str(p).unwrap_or_else(|_| Value::String(p.clone())))
        .collect();

    let result = manager
        .execute(fragment_id, function_name, parameters)
        .await
        .with_context(|| format!("executing {}::{}", fragment_id, function_name))?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn place(manager: &DistributionManager, args: &[String]) -> Result<()> {
    let [fragment_id, location] = args else {
        bail!("place needs <fragment_id> <local|remote>");
    };
    let location = location
        .parse::<ExecutionLocation>()
        .map_err(anyhow::Error::msg)?;

    manager.update_placement(fragment_id, location).await?;
    println!("{} -> {}", fragment_id, location);
    Ok(())
}

async fn status(manager: &DistributionManager) -> Result<()> {
    println!("Connection: {} ({})", manager.client().state(), manager.client().endpoint());
    println!(
        "Worker pool: {}/{} busy, {} queued",
        manager.local().pool().busy(),
        manager.local().pool().capacity(),
        manager.local().pool().queued()
    );
    println!();
    println!("{:<32} {:<8} {}", "FRAGMENT", "PLACED", "LOADED");
    for entry in manager.registry().snapshot().await.to_entries() {
        let loaded = manager.local().is_loaded(&entry.id).await;
        println!(
            "{:<32} {:<8} {}",
            entry.id,
            entry.execution_location.as_str(),
            if loaded { "yes" } else { "no" }
        );
    }
    Ok(())
}
