/// Offline what-if classification
/// Run with: cargo run --bin classify -- inputs.json
///       or: echo '{"sentiment":{"score":70}}' | cargo run --bin classify

use anyhow::{Context, Result};
use regimebot::models::RegimeInputs;
use regimebot::regime::classify_regime;
use std::io::Read;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("regimebot=info")
        .try_init()
        .ok();

    let raw = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let inputs: RegimeInputs = serde_json::from_str(&raw).context("Invalid RegimeInputs JSON")?;
    let result = classify_regime(&inputs);

    println!("\n📊 Regime: {} (confidence {})", result.regime, result.confidence);
    println!("   Inputs present: {}/5\n", inputs.present_count());
    for driver in &result.drivers {
        println!(
            "  {:<14} {:<6} {:<7} {}",
            driver.label,
            format!("{:?}", driver.direction).to_lowercase(),
            format!("{:?}", driver.strength).to_lowercase(),
            driver.detail
        );
    }
    println!();

    Ok(())
}
