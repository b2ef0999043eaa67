//! Set Partitioning Demo
//!
//! Encodes an exact-cover instance as a penalty QUBO, samples it and checks
//! every returned assignment for feasibility.

use anyhow::{Context, Result};
use clap::Parser;

use optiq_demos::problems::set_partition_instance;
use optiq_demos::{
    create_solver, create_spinner, init_logging, print_header, print_result, print_section,
    print_success, print_warning,
};
use optiq_hal::{JobConfig, Problem};
use optiq_model::Penalty;
use optiq_model::interpret::{interpret_partition, verify_energies};

#[derive(Parser, Debug)]
#[command(name = "demo-set-partition")]
#[command(about = "Solve a set-partitioning instance as a QUBO")]
struct Args {
    /// Instance (small-crew, disjoint)
    #[arg(short, long, default_value = "small-crew")]
    instance: String,

    /// Backend (sim, qci)
    #[arg(short, long, default_value = "sim")]
    backend: String,

    /// Number of samples
    #[arg(short, long, default_value = "10")]
    samples: u32,

    /// Penalty weight, or "auto"
    #[arg(long, default_value = "auto")]
    penalty: String,

    /// Seed for the local sampler
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    print_header("Set Partitioning on a QUBO Sampler");

    let partition = set_partition_instance(&args.instance)?;
    let penalty: Penalty = args
        .penalty
        .parse()
        .with_context(|| format!("Invalid --penalty '{}'", args.penalty))?;

    print_section("Problem Setup");
    print_result("Instance", &args.instance);
    print_result("Elements", partition.num_elements);
    print_result("Subsets", partition.num_subsets());
    for (j, subset) in partition.subsets.iter().enumerate() {
        println!("    S{j}: {subset:?}  cost {}", partition.cost(j));
    }
    if let Some((x, cost)) = partition.brute_force_optimum() {
        let selected: Vec<usize> = x
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == 1)
            .map(|(j, _)| j)
            .collect();
        print_result("Optimal cover (exact)", format!("{selected:?}, cost {cost}"));
    }

    print_section("QUBO Encoding");
    println!("  E(x) = Σ c_j x_j + P · Σ_i (Σ_j A_ij x_j − 1)²");
    println!();
    let qubo = partition.to_qubo(penalty)?;
    print_result("Penalty P", partition.penalty_weight(penalty)?);
    print_result("Variables", qubo.num_variables());
    print_result("Offset P·m", qubo.offset());
    print_result("Largest |Q_ij|", qubo.max_abs_coefficient());

    print_section("Sampling");
    let problem = Problem::Qubo(qubo);
    let mut config = JobConfig::for_problem(&problem, args.samples)
        .with_job_name(format!("set-partition-{}", args.instance));
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }

    let solver = create_solver(&args.backend)?;
    print_result("Backend", solver.name());
    print_result("Device", config.device);

    let spinner = create_spinner("Submitting...")?;
    let job_id = solver.submit(&problem, &config).await?;
    spinner.set_message(format!("Waiting for job {job_id}..."));
    let result = solver.wait(&job_id).await;
    spinner.finish_and_clear();
    let result = result?;

    print_result("Job", &job_id);
    print_result("Distinct samples", result.samples.len());
    if let Some(ms) = result.wall_time_ms {
        print_result("Wall time", format!("{ms} ms"));
    }

    let mismatches = verify_energies(&result.samples, problem.objective(), 1e-6)?;
    if !mismatches.is_empty() {
        print_warning(&format!(
            "{} samples disagree with the local energy",
            mismatches.len()
        ));
    }

    print_section("Interpretation");
    let summary = interpret_partition(&partition, &result.samples)?;
    for checked in summary.samples.iter().take(8) {
        println!(
            "  {:?}  energy {:>10.3}  x{:<3} {}",
            checked.report.selected,
            checked.energy,
            checked.count,
            if checked.report.feasible {
                "feasible".to_string()
            } else {
                format!(
                    "uncovered {:?} overcovered {:?}",
                    checked.report.uncovered, checked.report.overcovered
                )
            }
        );
    }
    println!();
    print_result(
        "Feasible reads",
        format!("{:.1}%", summary.feasible_fraction * 100.0),
    );

    match summary.best() {
        Some(best) => {
            print_success(&format!(
                "Best cover {:?} with cost {}",
                best.report.selected, best.report.cost
            ));
            if let Some((_, optimum)) = partition.brute_force_optimum() {
                if best.report.cost <= optimum {
                    print_success("Matches the exact optimum");
                } else {
                    print_warning(&format!("Exact optimum is {optimum}"));
                }
            }
        }
        None => print_warning("No feasible sample; try more samples or a larger penalty"),
    }

    Ok(())
}
