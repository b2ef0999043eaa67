//! Shared helpers for CLI commands.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use console::style;
use serde::{Deserialize, Serialize};

use optiq_adapter_qci::{DEFAULT_BASE_URL, QciSolver};
use optiq_adapter_sim::SimSolver;
use optiq_hal::{Problem, SolveResult, Solver};
use optiq_model::interpret::PartitionSummary;
use optiq_model::{Penalty, Sample, SampleSet, SetPartition};

/// Config file name inside the state directory.
pub const CONFIG_FILE: &str = "config.yaml";

/// Log of jobs submitted to the hosted service.
pub const JOB_LOG_FILE: &str = "jobs.json";

/// Rows shown by [`print_results`].
const MAX_ROWS: usize = 16;

/// Return the optiq state directory (`$OPTIQ_HOME` or `~/.optiq/`).
pub fn default_state_dir() -> Result<PathBuf> {
    let state_dir = match std::env::var_os("OPTIQ_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .join(".optiq"),
    };
    if !state_dir.exists() {
        fs::create_dir_all(&state_dir).with_context(|| {
            format!("Failed to create state directory: {}", state_dir.display())
        })?;
    }
    Ok(state_dir)
}

/// Settings for the hosted service.
#[derive(Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QciSettings {
    /// Refresh token.
    pub token: Option<String>,
    /// API base URL.
    pub api_url: Option<String>,
}

impl fmt::Debug for QciSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QciSettings")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Defaults for `optiq run`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDefaults {
    /// Backend when `--backend` is omitted.
    pub backend: Option<String>,
    /// Samples when `--samples` is omitted.
    pub samples: Option<u32>,
    /// Relaxation schedule when `--schedule` is omitted.
    pub relaxation_schedule: Option<u8>,
}

/// Contents of `~/.optiq/config.yaml`.
///
/// ```yaml
/// qci:
///   token: "..."
///   api_url: https://api.qci-prod.com
/// defaults:
///   backend: qci
///   samples: 20
/// ```
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Hosted service settings.
    pub qci: QciSettings,
    /// Defaults for `run`.
    pub defaults: RunDefaults,
}

impl CliConfig {
    /// Load the config file (if any), then apply `QCI_TOKEN` / `QCI_API_URL`.
    pub fn load() -> Result<Self> {
        let path = default_state_dir()?.join(CONFIG_FILE);
        let config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        Ok(config.with_env_overrides(
            std::env::var("QCI_TOKEN").ok(),
            std::env::var("QCI_API_URL").ok(),
        ))
    }

    /// Parse a config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_yaml(&source).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Parse YAML config text.
    pub fn from_yaml(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(source)?)
    }

    /// Environment values win over the file.
    pub fn with_env_overrides(mut self, token: Option<String>, api_url: Option<String>) -> Self {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.qci.token = Some(token);
        }
        if let Some(url) = api_url.filter(|u| !u.is_empty()) {
            self.qci.api_url = Some(url);
        }
        self
    }

    /// Base URL for the hosted service.
    pub fn api_url(&self) -> &str {
        self.qci.api_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }
}

/// Create a solver by name.
pub fn create_solver(backend: &str, config: &CliConfig) -> Result<Box<dyn Solver>> {
    match backend.to_lowercase().as_str() {
        "sim" | "simulator" | "local" => Ok(Box::new(SimSolver::new())),
        "qci" | "dirac" => Ok(Box::new(create_qci_solver(config)?)),
        other => anyhow::bail!("Unknown backend: '{other}'. Available: sim, qci"),
    }
}

/// Create the hosted-service solver from config and environment.
pub fn create_qci_solver(config: &CliConfig) -> Result<QciSolver> {
    let token = config.qci.token.clone().ok_or_else(|| {
        anyhow::anyhow!("No QCi token configured. Set QCI_TOKEN or qci.token in ~/.optiq/config.yaml")
    })?;
    QciSolver::with_credentials(token, config.api_url())
        .map_err(|e| anyhow::anyhow!("Failed to create QCi client: {e}"))
}

fn read_json(path: &str) -> Result<serde_json::Value> {
    let path_obj = Path::new(path);
    if !path_obj.exists() {
        anyhow::bail!("File not found: {path}");
    }
    let source =
        fs::read_to_string(path).with_context(|| format!("Failed to read file: {path}"))?;
    serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {path}"))
}

/// Load a set-partition instance and check it.
pub fn load_set_partition(path: &str) -> Result<SetPartition> {
    let value = read_json(path)?;
    let problem: SetPartition = serde_json::from_value(value)
        .with_context(|| format!("{path} is not a set-partition instance"))?;
    problem
        .validate()
        .with_context(|| format!("Invalid set-partition instance in {path}"))?;
    Ok(problem)
}

/// Load a problem file.
///
/// Accepts an encoded problem (`{"type": "qubo", ...}`) or a raw
/// set-partition instance, which is encoded with the automatic penalty.
pub fn load_problem(path: &str) -> Result<Problem> {
    let value = read_json(path)?;
    if value.get("subsets").is_some() {
        let partition: SetPartition = serde_json::from_value(value)
            .with_context(|| format!("{path} is not a set-partition instance"))?;
        partition.validate()?;
        let qubo = partition.to_qubo(Penalty::Auto)?;
        return Ok(Problem::Qubo(qubo));
    }
    serde_json::from_value(value).with_context(|| {
        format!("{path} is not an encoded problem (expected \"type\": qubo, hamiltonian or polynomial)")
    })
}

/// Load samples saved by `optiq run --output` / `optiq result --format json`,
/// or a bare sample set.
pub fn load_samples(path: &str) -> Result<SampleSet> {
    let value = read_json(path)?;
    if value.get("job_id").is_some() {
        let result: SolveResult = serde_json::from_value(value)
            .with_context(|| format!("{path} is not a saved result"))?;
        return Ok(result.samples);
    }
    serde_json::from_value(value).with_context(|| format!("{path} is not a sample set"))
}

/// Write `value` as pretty JSON.
pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("JSON serialization failed")?;
    fs::write(path, json).with_context(|| format!("Failed to write {path}"))
}

/// Add `offset` to every energy and record it in the metadata.
pub fn apply_energy_offset(result: SolveResult, offset: f64) -> SolveResult {
    if offset == 0.0 {
        return result;
    }
    let samples = SampleSet::new(
        result
            .samples
            .into_iter()
            .map(|mut s| {
                s.energy += offset;
                s
            })
            .collect(),
    );
    SolveResult {
        samples,
        ..result
    }
    .with_metadata("energy_offset", serde_json::json!(offset))
}

/// A job submitted to the hosted service from this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Service job ID.
    pub job_id: String,
    /// Device the job ran on.
    pub device: String,
    /// Problem kind (qubo, hamiltonian, polynomial).
    pub kind: String,
    /// Constant the service leaves out of reported energies.
    pub energy_offset: f64,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
}

/// JSON-file log of submitted jobs.
#[derive(Debug)]
pub struct JobLog {
    path: PathBuf,
    records: Vec<JobRecord>,
}

impl JobLog {
    /// Open the log in the default state directory.
    pub fn open_default() -> Result<Self> {
        Self::open(default_state_dir()?.join(JOB_LOG_FILE))
    }

    /// Open the log at `path`; a missing file is an empty log.
    pub fn open(path: PathBuf) -> Result<Self> {
        let records = if path.exists() {
            let source = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read job log: {}", path.display()))?;
            if source.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&source)
                    .with_context(|| format!("Corrupt job log: {}", path.display()))?
            }
        } else {
            Vec::new()
        };
        Ok(Self { path, records })
    }

    /// Append a record and save.
    pub fn record(&mut self, record: JobRecord) -> Result<()> {
        self.records.retain(|r| r.job_id != record.job_id);
        self.records.push(record);
        let json = serde_json::to_string_pretty(&self.records)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write job log: {}", self.path.display()))
    }

    /// Look up a job.
    pub fn find(&self, job_id: &str) -> Option<&JobRecord> {
        self.records.iter().find(|r| r.job_id == job_id)
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }
}

fn format_values(sample: &Sample) -> String {
    let binary = sample.values.iter().all(|v| *v == 0.0 || *v == 1.0);
    if binary {
        sample
            .values
            .iter()
            .map(|v| if *v == 1.0 { '1' } else { '0' })
            .collect()
    } else {
        let shown: Vec<String> = sample
            .values
            .iter()
            .take(8)
            .map(|v| format!("{v:.4}"))
            .collect();
        let more = if sample.values.len() > 8 { ", ..." } else { "" };
        format!("[{}{more}]", shown.join(", "))
    }
}

/// Print a result as a table (shared by run and result).
pub fn print_results(result: &SolveResult) {
    println!(
        "\n{} Results from {} ({} distinct, {} reads):",
        style("✓").green().bold(),
        style(&result.device).yellow(),
        result.samples.len(),
        result.samples.total_count()
    );

    println!(
        "  {:>4}  {:>14}  {:>6}  {}",
        style("#").bold(),
        style("ENERGY").bold(),
        style("COUNT").bold(),
        style("VALUES").bold()
    );
    for (rank, sample) in result.samples.iter().take(MAX_ROWS).enumerate() {
        println!(
            "  {:>4}  {:>14.6}  {:>6}  {}",
            rank + 1,
            sample.energy,
            sample.count,
            style(format_values(sample)).cyan()
        );
    }
    if result.samples.len() > MAX_ROWS {
        println!("  ... and {} more samples", result.samples.len() - MAX_ROWS);
    }

    if let Some(time_ms) = result.wall_time_ms {
        println!("\n  Wall time: {} ms", style(time_ms).yellow());
    }
}

/// Print a set-partition feasibility summary.
pub fn print_partition_summary(problem: &SetPartition, summary: &PartitionSummary) {
    println!(
        "\n{} Set partitioning: {} elements, {} subsets",
        style("→").cyan().bold(),
        problem.num_elements,
        problem.num_subsets()
    );
    println!(
        "  Feasible reads: {}",
        style(format!("{:.1}%", summary.feasible_fraction * 100.0)).yellow()
    );

    match summary.best() {
        Some(best) => {
            println!(
                "  {} Best feasible: subsets {:?}, cost {}",
                style("✓").green().bold(),
                best.report.selected,
                style(best.report.cost).green()
            );
        }
        None => {
            println!("  {} No feasible sample", style("✗").red().bold());
            if let Some(first) = summary.samples.first() {
                println!(
                    "    Lowest-energy sample: uncovered {:?}, overcovered {:?}",
                    first.report.uncovered, first.report.overcovered
                );
            }
        }
    }
}
