//! Run command implementation.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use optiq_adapter_qci::files::energy_offset;
use optiq_hal::{DeviceKind, JobConfig, JobType, Problem, WaitOptions};
use optiq_model::interpret::{interpret_continuous, interpret_partition, verify_energies};

use super::common::{
    CliConfig, JobLog, JobRecord, create_solver, load_problem, load_set_partition,
    print_partition_summary, print_results, write_json,
};

/// Samples when neither the flag nor the config sets them.
const DEFAULT_SAMPLES: u32 = 10;

/// Tolerance for local energy and constraint checks.
const CHECK_TOLERANCE: f64 = 1e-6;

/// Options of `optiq run`.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub backend: Option<String>,
    pub device: Option<String>,
    pub samples: Option<u32>,
    pub schedule: Option<u8>,
    pub sum_constraint: Option<f64>,
    pub precision: Option<f64>,
    pub levels: Option<Vec<u32>>,
    pub seed: Option<u64>,
    pub name: Option<String>,
    pub check: Option<String>,
    pub output: Option<String>,
    pub timeout: Option<u64>,
}

/// Build the job configuration from flags and config-file defaults.
pub fn job_config(problem: &Problem, options: &RunOptions, config: &CliConfig) -> Result<JobConfig> {
    let device = match &options.device {
        Some(d) => d.parse::<DeviceKind>()?,
        None => DeviceKind::for_problem(problem),
    };
    let samples = options
        .samples
        .or(config.defaults.samples)
        .unwrap_or(DEFAULT_SAMPLES);

    let mut job = JobConfig::new(device, samples);
    if device == DeviceKind::Dirac3 {
        if let Some(schedule) = options.schedule.or(config.defaults.relaxation_schedule) {
            job = job.with_relaxation_schedule(schedule);
        }
    } else if options.schedule.is_some() {
        anyhow::bail!("--schedule applies to dirac-3 only");
    }
    if let Some(r) = options.sum_constraint {
        job = job.with_sum_constraint(r);
    }
    if let Some(p) = options.precision {
        job = job.with_solution_precision(p);
    }
    if let Some(levels) = &options.levels {
        job = job.with_num_levels(levels.clone());
    }
    if let Some(seed) = options.seed {
        job = job.with_seed(seed);
    }
    if let Some(name) = &options.name {
        job = job.with_job_name(name);
    }
    job.validate()?;
    Ok(job)
}

/// Execute the run command.
pub async fn execute(problem_path: &str, options: RunOptions) -> Result<()> {
    let config = CliConfig::load()?;
    let backend = options
        .backend
        .clone()
        .or_else(|| config.defaults.backend.clone())
        .unwrap_or_else(|| "sim".into());

    let problem = load_problem(problem_path)?;
    let job = job_config(&problem, &options, &config)?;
    let job_type = job.job_type(&problem)?;

    println!(
        "{} Running {} on {} ({} as {}, {} samples)",
        style("→").cyan().bold(),
        style(problem_path).green(),
        style(&backend).yellow(),
        job.device,
        job_type,
        job.num_samples
    );
    println!(
        "  Loaded: {} with {} variables, degree {}",
        problem.kind(),
        problem.num_variables(),
        problem.degree()
    );

    let solver = create_solver(&backend, &config)?;

    let avail = solver.availability().await?;
    if !avail.is_available {
        anyhow::bail!(
            "Backend '{backend}' is not available: {}",
            avail.status_message.unwrap_or_default()
        );
    }

    let validation = solver.validate(&problem, &job).await?;
    if let optiq_hal::ValidationResult::Invalid { reasons } = &validation {
        for reason in reasons {
            println!("  {} {}", style("✗").red(), reason);
        }
        anyhow::bail!("Problem rejected by '{backend}'");
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Submitting job...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let job_id = solver.submit(&problem, &job).await?;
    spinner.set_message(format!("Waiting for job {job_id}..."));

    if !solver.capabilities().is_simulator {
        let mut log = JobLog::open_default()?;
        log.record(JobRecord {
            job_id: job_id.0.clone(),
            device: job.device.to_string(),
            kind: problem.kind().into(),
            energy_offset: energy_offset(&problem),
            submitted_at: Utc::now(),
        })?;
    }

    let waited = match options.timeout {
        Some(secs) => {
            solver
                .wait_with(
                    &job_id,
                    WaitOptions::new(Duration::from_secs(1), Duration::from_secs(secs)),
                )
                .await
        }
        None => solver.wait(&job_id).await,
    };
    spinner.finish_and_clear();
    let result = waited.with_context(|| format!("Job {job_id} did not complete"))?;

    print_results(&result);

    let mismatches = verify_energies(&result.samples, problem.objective(), CHECK_TOLERANCE)?;
    if !mismatches.is_empty() {
        println!(
            "  {} {} sample(s) report energies that differ from the local objective",
            style("!").yellow().bold(),
            mismatches.len()
        );
    }

    if job_type == JobType::SampleHamiltonian {
        if let Some(best) = result.samples.best() {
            let report = interpret_continuous(
                problem.objective(),
                best,
                Some(job.effective_sum_constraint()),
                CHECK_TOLERANCE * job.effective_sum_constraint(),
            )?;
            println!(
                "  Best sample: Σx = {:.6} (target {}) {}",
                report.sum,
                job.effective_sum_constraint(),
                if report.sum_ok {
                    style("✓").green()
                } else {
                    style("✗").red()
                }
            );
        }
    }

    if let Some(path) = &options.check {
        let partition = load_set_partition(path)?;
        let summary = interpret_partition(&partition, &result.samples)?;
        print_partition_summary(&partition, &summary);
    }

    if let Some(path) = &options.output {
        write_json(path, &result)?;
        println!("\n  Saved result to {}", style(path).green());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use optiq_model::{Hamiltonian, Qubo};

    #[test]
    fn test_job_config_defaults() {
        let problem = Problem::Qubo(Qubo::new(3));
        let job = job_config(&problem, &RunOptions::default(), &CliConfig::default()).unwrap();
        assert_eq!(job.device, DeviceKind::Dirac1);
        assert_eq!(job.num_samples, DEFAULT_SAMPLES);
    }

    #[test]
    fn test_job_config_uses_file_defaults() {
        let problem = Problem::Hamiltonian(Hamiltonian::new(2));
        let config =
            CliConfig::from_yaml("defaults:\n  samples: 7\n  relaxation_schedule: 3\n").unwrap();
        let options = RunOptions {
            sum_constraint: Some(5.0),
            ..RunOptions::default()
        };
        let job = job_config(&problem, &options, &config).unwrap();
        assert_eq!(job.device, DeviceKind::Dirac3);
        assert_eq!(job.num_samples, 7);
        assert_eq!(job.relaxation_schedule, Some(3));
        assert_eq!(job.sum_constraint, Some(5.0));
    }

    #[test]
    fn test_job_config_rejects_schedule_on_dirac1() {
        let problem = Problem::Qubo(Qubo::new(3));
        let options = RunOptions {
            schedule: Some(2),
            ..RunOptions::default()
        };
        assert!(job_config(&problem, &options, &CliConfig::default()).is_err());
    }

    #[test]
    fn test_job_config_rejects_bad_sum_constraint() {
        let problem = Problem::Hamiltonian(Hamiltonian::new(2));
        let options = RunOptions {
            sum_constraint: Some(0.1),
            ..RunOptions::default()
        };
        assert!(job_config(&problem, &options, &CliConfig::default()).is_err());
    }
}
