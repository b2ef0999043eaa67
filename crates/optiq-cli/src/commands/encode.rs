//! Encode command implementation.

use anyhow::{Context, Result};
use console::style;

use optiq_hal::Problem;
use optiq_model::Penalty;

use super::common::{load_set_partition, write_json};

/// Encode a set-partition instance as a QUBO problem file.
pub fn execute_set_partition(input: &str, output: Option<&str>, penalty: &str) -> Result<()> {
    let penalty: Penalty = penalty
        .parse()
        .with_context(|| format!("Invalid --penalty '{penalty}'"))?;
    let partition = load_set_partition(input)?;
    let weight = partition.penalty_weight(penalty)?;
    let qubo = partition.to_qubo(penalty)?;

    let problem = Problem::Qubo(qubo);
    match output {
        Some(path) => {
            write_json(path, &problem)?;
            eprintln!(
                "{} Encoded {} subsets over {} elements (penalty {}) to {}",
                style("✓").green().bold(),
                partition.num_subsets(),
                partition.num_elements,
                weight,
                style(path).green()
            );
        }
        None => {
            let json = serde_json::to_string_pretty(&problem)?;
            println!("{json}");
        }
    }

    Ok(())
}
