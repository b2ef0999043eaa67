//! Qudit Hamiltonian Demo
//!
//! Samples a mean-variance allocation over continuous variables under the
//! sum constraint `Σx = R`, or over integer levels.

use anyhow::Result;
use clap::Parser;

use optiq_demos::problems::demo_allocation;
use optiq_demos::{
    create_solver, create_spinner, init_logging, print_header, print_result, print_section,
    print_success, print_warning,
};
use optiq_hal::{DeviceKind, JobConfig, JobType, Problem};
use optiq_model::interpret::interpret_continuous;

#[derive(Parser, Debug)]
#[command(name = "demo-qudit-hamiltonian")]
#[command(about = "Sample a qudit Hamiltonian under a sum constraint")]
struct Args {
    /// Backend (sim, qci)
    #[arg(short, long, default_value = "sim")]
    backend: String,

    /// Number of samples
    #[arg(short, long, default_value = "5")]
    samples: u32,

    /// Sum constraint R
    #[arg(long, default_value = "1")]
    sum_constraint: f64,

    /// Precision of returned values
    #[arg(long)]
    precision: Option<f64>,

    /// Relaxation schedule (1-4)
    #[arg(long, default_value = "1")]
    schedule: u8,

    /// Sample integer levels instead (levels per variable)
    #[arg(long)]
    levels: Option<u32>,

    /// Seed for the local sampler
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    print_header("Qudit Hamiltonian Sampling");

    let h = demo_allocation()?;
    let n = h.num_variables();

    print_section("Problem Setup");
    println!("  E(x) = Σ C_i x_i + Σ J_ij x_i x_j");
    println!();
    print_result("Variables", n);
    print_result("Linear C", format!("{:?}", h.linear().to_vec()));
    print_result("Largest coefficient", h.max_abs_coefficient());

    let problem = Problem::Hamiltonian(h);
    let mut config = JobConfig::new(DeviceKind::Dirac3, args.samples)
        .with_relaxation_schedule(args.schedule)
        .with_job_name("qudit-allocation");
    match args.levels {
        Some(levels) => config = config.with_num_levels(vec![levels; n]),
        None => {
            config = config.with_sum_constraint(args.sum_constraint);
            if let Some(p) = args.precision {
                config = config.with_solution_precision(p);
            }
        }
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    config.validate()?;
    let job_type = config.job_type(&problem)?;
    print_result("Job type", job_type);
    if job_type == JobType::SampleHamiltonian {
        print_result("Sum constraint", config.effective_sum_constraint());
    }

    print_section("Sampling");
    let solver = create_solver(&args.backend)?;
    print_result("Backend", solver.name());

    let spinner = create_spinner("Submitting...")?;
    let job_id = solver.submit(&problem, &config).await?;
    spinner.set_message(format!("Waiting for job {job_id}..."));
    let result = solver.wait(&job_id).await;
    spinner.finish_and_clear();
    let result = result?;

    print_result("Job", &job_id);
    print_result("Distinct samples", result.samples.len());

    print_section("Interpretation");
    let sum_constraint = match job_type {
        JobType::SampleHamiltonian => Some(config.effective_sum_constraint()),
        _ => None,
    };
    for sample in result.samples.iter() {
        let report = interpret_continuous(problem.objective(), sample, sum_constraint, 1e-6)?;
        let values: Vec<String> = sample.values.iter().map(|v| format!("{v:.3}")).collect();
        println!(
            "  [{}]  energy {:>9.5}  Σx {:.4} {}",
            values.join(", "),
            report.energy,
            report.sum,
            if report.sum_ok { "✓" } else { "✗" }
        );
    }

    match result.samples.best() {
        Some(best) => {
            let report = interpret_continuous(problem.objective(), best, sum_constraint, 1e-6)?;
            if report.sum_ok && report.min_value >= 0.0 {
                print_success(&format!("Best energy {:.5}", report.energy));
            } else {
                print_warning("Best sample violates the device constraints");
            }
        }
        None => print_warning("No samples returned"),
    }

    Ok(())
}
