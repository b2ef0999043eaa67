//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - optimization problem encoding and hosted solver client",
        style("optiq").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  optiq-model        QUBO, Hamiltonian and set-partition encoders");
    println!("  optiq-hal          Solver abstraction and job lifecycle");
    println!("  optiq-adapter-qci  Hosted optimization service client");
    println!("  optiq-adapter-sim  Local sampler");
    println!("  optiq-cli          Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
