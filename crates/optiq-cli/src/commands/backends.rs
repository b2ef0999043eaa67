//! Backends command implementation.

use anyhow::Result;
use console::style;

use optiq_adapter_sim::SimSolver;
use optiq_hal::{Capabilities, Solver};

use super::common::{CliConfig, create_qci_solver};

fn print_capabilities(caps: &Capabilities) {
    let domains: Vec<String> = caps.domains.iter().map(ToString::to_string).collect();
    println!("    Variables: up to {}", caps.max_variables);
    println!("    Max samples: {}", caps.max_samples);
    println!("    Max degree: {}", caps.max_degree);
    println!("    Domains: {}", domains.join(", "));
}

/// Execute the backends command.
pub async fn execute() -> Result<()> {
    println!("{} Available backends:\n", style("optiq").cyan().bold());

    let sim = SimSolver::new();
    let available = sim.availability().await?.is_available;
    println!(
        "  {} {} (local)",
        if available {
            style("●").green()
        } else {
            style("○").red()
        },
        style("sim").bold()
    );
    print_capabilities(sim.capabilities());
    println!();

    let config = CliConfig::load()?;
    match create_qci_solver(&config) {
        Ok(qci) => {
            let available = qci.availability().await.is_ok_and(|a| a.is_available);
            println!(
                "  {} {} ({})",
                if available {
                    style("●").green()
                } else {
                    style("○").yellow()
                },
                style("qci").bold(),
                config.api_url()
            );
            for caps in [Capabilities::dirac1(), Capabilities::dirac3()] {
                println!("   {} {}", style("─").dim(), caps.name);
                print_capabilities(&caps);
            }
            if !available {
                println!("    Status: authentication failed or service unreachable");
            }
        }
        Err(_) => {
            println!(
                "  {} {} (not configured)",
                style("○").dim(),
                style("qci").dim()
            );
            println!("    Set QCI_TOKEN or qci.token in ~/.optiq/config.yaml to enable");
        }
    }
    println!();

    Ok(())
}
