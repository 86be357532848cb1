//! Run one PSI round from a JSON file and print the outcome.
//!
//! Usage: `psi_round <units.json>` where the file holds
//! `{"bob_units": [...], "alice_units": [...]}` in any accepted unit shape.

use anyhow::{bail, Context, Result};
use psi_fog_app::adapters::outbound::{
    init_console_logger, install_tracing_subscriber, HttpRoundTransport,
};
use psi_fog_app::application::RoundClient;
use psi_fog_app::Config;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct UnitsFile {
    #[serde(default)]
    bob_units: Vec<Value>,
    #[serde(default)]
    alice_units: Vec<Value>,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_tracing_subscriber("warn")?;

    let Some(path) = std::env::args().nth(1) else {
        bail!("usage: psi_round <units.json>");
    };
    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read {path}"))?;
    let units: UnitsFile =
        serde_json::from_str(&content).with_context(|| format!("{path} is not a units file"))?;

    let config = Config::load("psi-fog.toml")?;
    let transport = Arc::new(HttpRoundTransport::new(&config.endpoint)?);
    let client = RoundClient::new(transport, init_console_logger("psi_round"));

    let result = client.run_json(&units.bob_units, &units.alice_units).await?;

    println!("backend: {}", result.backend_label);
    println!("intersection ({}):", result.intersected.len());
    for unit in &result.intersected {
        println!("  {}", unit.unit);
    }
    let t = result.performance;
    println!(
        "timings (ms): total {:.2}, bob setup {:.2}, key exchange {:.2}, intersection {:.2}",
        t.total_time, t.bob_setup_time, t.key_exchange_time, t.intersection_time
    );
    Ok(())
}
