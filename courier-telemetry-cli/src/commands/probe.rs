//! Probe command - find the first reachable backend and check it answers.

use tracing::info;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the probe command.
pub async fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("probe");
    let client = runner.create_client()?;
    let resolver = client.resolver();

    println!("Probing {} candidate(s)...", resolver.candidates().len());
    for candidate in resolver.candidates() {
        println!("  {}", candidate);
    }
    println!();

    let address = resolver
        .resolve()
        .await
        .map_err(|e| CliError::Api(e.into()))?;
    println!("Using backend: {}", address);

    match client.test_connection().await {
        Ok(body) => {
            info!(address = %address, "Backend connection verified");
            println!("Connection OK: {}", body);
        }
        Err(e) => {
            resolver.log_stats();
            return Err(e.into());
        }
    }

    let stats = resolver.stats();
    println!(
        "Probes sent: {} in {} pass(es)",
        stats.probe_attempts, stats.probe_passes
    );
    resolver.log_stats();

    Ok(())
}
