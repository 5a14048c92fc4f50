//! Deploy command.

use super::{builder, parse_tfc_address};
use crate::{TargetArgs, TfcArgs};
use anyhow::{Context, Result};
use stackrun_config::FileConfigStore;
use stackrun_executor::{ExecutionEvent, LocalProcessRunner};
use stackrun_scheduler::{Orchestrator, RunEvent, RunPhase, RunReport};
use stackrun_tfc::TfcClient;
use std::path::Path;
use std::sync::Arc;

/// Run a full deployment and print its progress.
pub async fn run(
    target: TargetArgs,
    tfc: TfcArgs,
    config_path: Option<&Path>,
    state_file: &Path,
) -> Result<()> {
    let address = parse_tfc_address(&tfc.tfc_address)?;
    let config = builder(target, config_path)?
        .with_organization(tfc.org)
        .with_token(tfc.token)
        .with_tfc_address(address.clone())
        .build()
        .context("Invalid run configuration")?;

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(TfcClient::new(&address)),
        Arc::new(LocalProcessRunner::new()),
        Arc::new(FileConfigStore::new(state_file)),
    )
    .context("Failed to resolve stacks")?;

    println!("Environment: {}", orchestrator.config().environment());
    println!("Team: {}", orchestrator.config().team());
    println!(
        "Stacks: {}",
        orchestrator
            .stacks()
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("State file: {}", state_file.display());

    let (mut rx, handle) = Arc::new(orchestrator).execute();
    while let Some(event) = rx.recv().await {
        render(event);
    }

    let report = handle.await.context("Deploy task failed")?;
    print_summary(&report);

    match report.error {
        Some(err) => Err(anyhow::Error::new(err).context("Deploy failed")),
        None => Ok(()),
    }
}

fn render(event: RunEvent) {
    match event {
        RunEvent::PhaseChanged { phase } => match phase {
            RunPhase::Provisioning => println!("\n--- Setting up workspaces ---\n"),
            RunPhase::Deploying => println!("\n--- Deploying stacks ---\n"),
            RunPhase::Aggregating => println!("\n--- Syncing infrastructure state ---\n"),
            RunPhase::Publishing => println!("\n--- Publishing state ---\n"),
            RunPhase::Idle | RunPhase::Done | RunPhase::Failed => {}
        },
        RunEvent::PriorState { key, cluster } => match cluster {
            Some(cluster) => println!("Found existing cluster '{}' in {}", cluster, key),
            None => println!("Found previous state in {}", key),
        },
        RunEvent::PriorStateUnavailable { key } => {
            println!("No state in {}, proceeding with setup", key);
        }
        RunEvent::WorkspaceProvisioned { result } => {
            if result.ok {
                println!("✓ Workspace '{}' ready", result.stack);
            } else {
                println!("✗ Workspace '{}' not created", result.stack);
            }
        }
        RunEvent::ProvisionDiagnostic { message } => println!("\n{}", message),
        RunEvent::Execution(ExecutionEvent::StackStarted { command_line, .. }) => {
            println!("▶ Running: {}", command_line);
        }
        RunEvent::Execution(ExecutionEvent::StackFinished { outcome }) => {
            if outcome.succeeded {
                println!("✓ Stack '{}' deployed\n", outcome.stack);
            } else {
                println!(
                    "✗ Stack '{}' failed with {}\n",
                    outcome.stack,
                    outcome.failure_reason()
                );
            }
        }
        RunEvent::Deployed { workspaces_url } => {
            println!("Deployed! View workspaces at {}", workspaces_url);
        }
        RunEvent::StatePublished { key, team, state } => {
            println!(
                "Saved {} outputs in your {} config as {}",
                state.len(),
                team,
                key
            );
        }
        RunEvent::RunCompleted { success } => {
            if success {
                println!("--- Deploy completed successfully ---");
            } else {
                println!("--- Deploy failed ---");
            }
        }
    }
}

fn print_summary(report: &RunReport) {
    println!("\n--- Stack Summary ---");
    for stack in &report.stacks {
        let status = match report.outcomes.iter().find(|o| &o.stack == stack) {
            Some(o) if o.succeeded => "✓ deployed".to_string(),
            Some(o) => format!("✗ failed ({})", o.failure_reason()),
            None => "○ not run".to_string(),
        };
        println!("  {} - {}", stack, status);
    }

    if let Some(state) = &report.state {
        match serde_json::to_string_pretty(state) {
            Ok(json) => println!("\n{} =\n{}", report.state_key, json),
            Err(e) => println!("\n{}: could not render state: {}", report.state_key, e),
        }
    }

    if report.success() {
        println!("\n✓ Run {} succeeded!", report.run_id);
    } else {
        println!("\n✗ Run {} failed", report.run_id);
    }
}
