//! Check command implementation.
//!
//! Interpret saved samples against a set-partition instance offline.

use anyhow::Result;
use console::style;

use optiq_model::interpret::interpret_partition;

use super::common::{load_samples, load_set_partition, print_partition_summary};

/// Execute the check command.
pub fn execute(problem: &str, samples: &str) -> Result<()> {
    let partition = load_set_partition(problem)?;
    let samples = load_samples(samples)?.sorted_by_energy();

    if samples.is_empty() {
        anyhow::bail!("No samples to check");
    }

    let summary = interpret_partition(&partition, &samples)?;
    print_partition_summary(&partition, &summary);

    println!();
    for checked in summary.samples.iter().take(10) {
        let mark = if checked.report.feasible {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!(
            "  {} {:?}  cost {:>8}  energy {:>12.4}  x{}",
            mark, checked.report.selected, checked.report.cost, checked.energy, checked.count
        );
    }

    Ok(())
}
