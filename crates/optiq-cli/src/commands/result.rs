//! Result command implementation.
//!
//! Retrieve and display results for a completed job.

use anyhow::Result;
use console::style;

use optiq_hal::{JobId, Solver};

use super::common::{
    CliConfig, JobLog, apply_energy_offset, create_qci_solver, print_results, write_json,
};

/// Execute the result command.
pub async fn execute(job_id: &str, format: &str, output: Option<&str>) -> Result<()> {
    let solver = create_qci_solver(&CliConfig::load()?)?;

    if format != "json" {
        println!(
            "{} Fetching results for job {}",
            style("→").cyan().bold(),
            style(job_id).dim()
        );
    }

    let mut result = solver.result(&JobId::new(job_id)).await?;
    match JobLog::open_default()?.find(job_id) {
        Some(record) => result = apply_energy_offset(result, record.energy_offset),
        None => tracing::warn!(
            "Job {} is not in the local job log; energies exclude any constant offset",
            job_id
        ),
    }

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&result)
                .map_err(|e| anyhow::anyhow!("JSON serialization failed: {e}"))?;
            println!("{json}");
        }
        "table" => print_results(&result),
        other => anyhow::bail!("Unknown format '{other}'. Available: table, json"),
    }

    if let Some(path) = output {
        write_json(path, &result)?;
    }

    Ok(())
}
