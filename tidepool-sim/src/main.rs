//! Tidepool scenario runner.
//!
//! Assembles a pool and its in-memory collaborators from a JSON
//! scenario, replays the scenario's actions, and prints the final
//! totals.

mod cli;
mod runner;
mod scenario;

use std::fs;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::runner::{Simulation, Summary};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    tracing::info!("Tidepool sim v{}", env!("CARGO_PKG_VERSION"));

    let scenario = scenario::load(&cli.scenario)?;
    let mut simulation = Simulation::new(&scenario)?;
    simulation.run(&scenario.actions, cli.keep_going)?;

    let summary = simulation.summary()?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    if let Some(path) = &cli.snapshot_out {
        let bytes = simulation.pool().snapshot_bytes()?;
        fs::write(path, bytes)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        tracing::info!(path = %path.display(), "snapshot written");
    }

    Ok(())
}

fn print_summary(summary: &Summary) {
    println!("total pooled ether  {}", summary.total_pooled_ether);
    println!("total shares        {}", summary.total_shares);
    println!("share rate (1e27)   {}", summary.share_rate);
    println!("buffered ether      {}", summary.buffered_ether);
    println!(
        "validators          {} deposited, {} on consensus layer ({} wei)",
        summary.deposited_validators, summary.cl_validators, summary.cl_balance
    );
    println!("el rewards          {}", summary.total_el_rewards_collected);
    println!(
        "withdrawals         {} requested, {} finalized, {} locked",
        summary.last_request_id, summary.last_finalized_request_id, summary.locked_ether
    );
    println!("reports settled     {}", summary.reports.len());
    println!("holders:");
    for holder in &summary.holders {
        println!("  {:<24} {} shares  {} wei", holder.account, holder.shares, holder.balance);
    }
    if !summary.failures.is_empty() {
        println!("failed actions:");
        for failure in &summary.failures {
            println!("  {failure}");
        }
    }
}
