//! Headless workflow runner.
//!
//! Loads a workflow snapshot exported from the console canvas, drives one
//! run against the Automation API, prints the run record as JSON on stdout,
//! and exits non-zero unless the run completed. Ctrl-C cancels the run at
//! the next step boundary.

mod config;
mod snapshot;

use config::RunnerConfig;
use fabric_ops_automation::{AutomationClient, CancelToken, Driver, RunContext, RunState};
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = RunnerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let path = std::env::args()
        .nth(1)
        .expect("usage: fabric-ops-runner <workflow.json>");
    let snapshot = snapshot::load(Path::new(&path)).expect("failed to load workflow snapshot");
    let workflow_label = snapshot.id.map(|id| id.to_string());
    tracing::info!(
        workflow = workflow_label.as_deref(),
        name = snapshot.name.as_deref(),
        nodes = snapshot.graph.node_count(),
        edges = snapshot.graph.edge_count(),
        "Loaded workflow snapshot"
    );

    let mut client = AutomationClient::new(&config.api.base_url);
    if let Some(token) = &config.api.bearer_token {
        client = client.with_bearer_token(token);
    }

    let mut driver = Driver::new(client);
    if let Some(limit) = config.step_timeout() {
        driver = driver.with_step_timeout(limit);
    }

    // Wire Ctrl-C to the run's cancellation token.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling after the current step");
                cancel.cancel();
            }
        });
    }

    let ctx = RunContext::new(config.variant.clone()).with_cancel(cancel);
    let run = driver.run(snapshot.graph, ctx).await;

    tracing::info!(
        run = %run.id,
        state = ?run.state,
        steps = run.log.len(),
        duration_ms = run.duration().num_milliseconds(),
        "Run finished"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&run).expect("serialize run record")
    );

    if run.state != RunState::Completed {
        std::process::exit(1);
    }
}
