//! optiq command-line interface
//!
//! ```text
//!   encode ──→ problem.json ──→ run ──→ samples ──→ check
//!                                │
//!                                └──→ status / result / cancel
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{backends, cancel, check, encode, result, run, status, version};

/// optiq - encode, submit and interpret optimization problems
#[derive(Parser)]
#[command(name = "optiq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a structured problem into a solver-ready form
    Encode {
        #[command(subcommand)]
        target: EncodeTarget,
    },

    /// Submit a problem, wait for it and print the samples
    Run {
        /// Problem file (encoded problem or set-partition JSON)
        #[arg(short, long)]
        problem: String,

        /// Backend to use (sim, qci)
        #[arg(short, long)]
        backend: Option<String>,

        /// Device (dirac-1, dirac-3); chosen from the problem when omitted
        #[arg(short, long)]
        device: Option<String>,

        /// Number of samples
        #[arg(short, long)]
        samples: Option<u32>,

        /// Relaxation schedule (1-4)
        #[arg(long)]
        schedule: Option<u8>,

        /// Sum constraint for continuous variables
        #[arg(long)]
        sum_constraint: Option<f64>,

        /// Precision of continuous values
        #[arg(long)]
        precision: Option<f64>,

        /// Levels per variable for integer sampling (comma separated)
        #[arg(long, value_delimiter = ',')]
        levels: Option<Vec<u32>>,

        /// Seed for the local sampler
        #[arg(long)]
        seed: Option<u64>,

        /// Job name
        #[arg(long)]
        name: Option<String>,

        /// Set-partition instance to check the samples against
        #[arg(long)]
        check: Option<String>,

        /// Write the result as JSON to this file
        #[arg(short, long)]
        output: Option<String>,

        /// Give up waiting after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Query job status on the hosted service
    Status {
        /// Job ID
        job_id: Option<String>,

        /// List jobs submitted from this machine
        #[arg(short, long)]
        all: bool,
    },

    /// Retrieve results for a completed job
    Result {
        /// Job ID
        job_id: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write the result as JSON to this file
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Cancel a queued or running job
    Cancel {
        /// Job ID
        job_id: String,
    },

    /// Check saved samples against a set-partition instance
    Check {
        /// Set-partition instance (JSON)
        #[arg(short, long)]
        problem: String,

        /// Saved result or sample set (JSON)
        #[arg(short, long)]
        samples: String,
    },

    /// List available backends
    Backends,

    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum EncodeTarget {
    /// Encode a set-partition instance as a QUBO
    SetPartition {
        /// Input file (JSON with num_elements, subsets, costs)
        #[arg(short, long)]
        input: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Constraint penalty weight, or "auto"
        #[arg(long, default_value = "auto")]
        penalty: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Encode { target } => match target {
            EncodeTarget::SetPartition {
                input,
                output,
                penalty,
            } => encode::execute_set_partition(&input, output.as_deref(), &penalty),
        },

        Commands::Run {
            problem,
            backend,
            device,
            samples,
            schedule,
            sum_constraint,
            precision,
            levels,
            seed,
            name,
            check,
            output,
            timeout,
        } => {
            let options = run::RunOptions {
                backend,
                device,
                samples,
                schedule,
                sum_constraint,
                precision,
                levels,
                seed,
                name,
                check,
                output,
                timeout,
            };
            run::execute(&problem, options).await
        }

        Commands::Status { job_id, all } => status::execute(job_id.as_deref(), all).await,

        Commands::Result {
            job_id,
            format,
            output,
        } => result::execute(&job_id, &format, output.as_deref()).await,

        Commands::Cancel { job_id } => cancel::execute(&job_id).await,

        Commands::Check { problem, samples } => check::execute(&problem, &samples),

        Commands::Backends => backends::execute().await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
