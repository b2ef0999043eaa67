//! Status command implementation.
//!
//! Query job status on the hosted service.

use anyhow::Result;
use console::style;

use optiq_hal::{JobId, JobStatus, Solver};

use super::common::{CliConfig, JobLog, create_qci_solver};

fn styled(status: &JobStatus) -> console::StyledObject<String> {
    let text = status.to_string();
    match status {
        JobStatus::Completed => style(text).green().bold(),
        JobStatus::Failed(_) | JobStatus::Cancelled => style(text).red().bold(),
        JobStatus::Queued => style(text).yellow().bold(),
        JobStatus::Running => style(text).cyan().bold(),
    }
}

/// Execute the status command.
pub async fn execute(job_id: Option<&str>, all: bool) -> Result<()> {
    if all {
        let log = JobLog::open_default()?;
        if log.records().is_empty() {
            println!("No jobs found.");
            return Ok(());
        }

        println!(
            "{} {} job(s) submitted from this machine:\n",
            style("→").cyan().bold(),
            log.records().len()
        );
        println!(
            "  {:<36}  {:<10}  {:<12}  {}",
            style("JOB ID").bold(),
            style("DEVICE").bold(),
            style("KIND").bold(),
            style("SUBMITTED").bold()
        );
        println!("  {}", "-".repeat(80));
        for record in log.records() {
            println!(
                "  {:<36}  {:<10}  {:<12}  {}",
                style(&record.job_id).dim(),
                record.device,
                record.kind,
                record.submitted_at.format("%Y-%m-%d %H:%M"),
            );
        }
        return Ok(());
    }

    let job_id = job_id
        .ok_or_else(|| anyhow::anyhow!("Please provide a job ID or use --all to list jobs"))?;

    let solver = create_qci_solver(&CliConfig::load()?)?;
    let status = solver.status(&JobId::new(job_id)).await?;

    println!(
        "{} Job {} status: {}",
        style("→").cyan().bold(),
        style(job_id).dim(),
        styled(&status)
    );
    if status.is_terminal() {
        println!("  Terminal: {}", style("yes").dim());
    }

    Ok(())
}
