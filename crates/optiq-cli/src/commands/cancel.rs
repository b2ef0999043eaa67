//! Cancel command implementation.

use anyhow::Result;
use console::style;

use optiq_hal::{JobId, Solver};

use super::common::{CliConfig, create_qci_solver};

/// Execute the cancel command.
pub async fn execute(job_id: &str) -> Result<()> {
    let solver = create_qci_solver(&CliConfig::load()?)?;
    solver.cancel(&JobId::new(job_id)).await?;

    println!(
        "{} Cancelled job {}",
        style("✓").green().bold(),
        style(job_id).dim()
    );
    Ok(())
}
