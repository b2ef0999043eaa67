//! optiq demo suite
//!
//! Walkthroughs of the full encode, submit, interpret loop:
//!
//! - **Set partitioning**: exact-cover instances encoded as a penalty QUBO
//!   and sampled on dirac-1 (or the local sampler)
//! - **Qudit Hamiltonian**: a continuous allocation problem under a sum
//!   constraint, sampled on dirac-3 (or the local sampler)
//!
//! Both demos run offline with `--backend sim`; `--backend qci` needs
//! `QCI_TOKEN`.

pub mod problems;

use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use optiq_adapter_qci::QciSolver;
use optiq_adapter_sim::SimSolver;
use optiq_hal::Solver;

/// Create the solver named on the command line.
pub fn create_solver(backend: &str) -> Result<Box<dyn Solver>> {
    match backend.to_lowercase().as_str() {
        "sim" | "simulator" => Ok(Box::new(SimSolver::new())),
        "qci" => {
            let solver = QciSolver::new()
                .map_err(|e| anyhow::anyhow!("Failed to create QCi client: {e}"))?;
            Ok(Box::new(solver))
        }
        other => anyhow::bail!("Unknown backend: '{other}'. Available: sim, qci"),
    }
}

/// Create a spinner for a running job.
pub fn create_spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

/// Install a `tracing` subscriber honouring `RUST_LOG`, default `warn`.
pub fn init_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}
