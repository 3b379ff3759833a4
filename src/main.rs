/*!
 * Simulation Trial Scheduler - Demo Entry Point
 *
 * Registers a cohort of synthetic trials, plays them under the configured
 * worker budget, and reports scheduler statistics once every trial finished.
 */

use ahash::HashSet;
use miette::IntoDiagnostic;
use sim_scheduler::core::config::parse_var;
use sim_scheduler::core::limits::{
    DEFAULT_DEMO_STEPS, DEFAULT_DEMO_TRIALS, ENV_DEMO_STEPS, ENV_DEMO_TRIALS,
};
use sim_scheduler::{
    init_tracing, HandleStatus, ProcessId, Scheduler, SchedulerConfig, SchedulerEvent,
    SchedulerResult, Trial,
};
use std::str::FromStr;
use tracing::{info, warn};

fn env_or<T>(key: &str, default: T) -> SchedulerResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_var(key, &raw),
        Err(_) => Ok(default),
    }
}

/// Synthetic workload: iterate a logistic map for a few thousand rounds
fn demo_trial(index: usize, steps: u64) -> Trial {
    let seed = 0.1 + (index as f64 * 0.07) % 0.8;
    Trial::new(format!("trial-{}", index))
        .with_max_steps(steps)
        .with_step_fn(move |step| {
            let mut x = seed + (step as f64 * 1e-6);
            for _ in 0..2_000 {
                x = 3.9 * x * (1.0 - x);
            }
            anyhow::ensure!(x.is_finite(), "population diverged at step {}", step);
            Ok(())
        })
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let config = SchedulerConfig::from_env()?;
    init_tracing(config.trace_json);

    let trials: usize = env_or(ENV_DEMO_TRIALS, DEFAULT_DEMO_TRIALS)?;
    let steps: u64 = env_or(ENV_DEMO_STEPS, DEFAULT_DEMO_STEPS)?;

    info!("Trial scheduler starting...");
    info!(capacity = config.capacity, trials, steps, "Configuration resolved");

    let scheduler = Scheduler::builder().with_config(config).build()?;
    let events = scheduler.subscribe();

    let ids = scheduler.register_batch_and_play((0..trials).map(|i| demo_trial(i, steps)));
    let mut remaining: HashSet<ProcessId> = ids.into_iter().collect();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    while !remaining.is_empty() {
        tokio::select! {
            event = events.recv_async() => {
                let Ok(event) = event else { break };
                match event {
                    SchedulerEvent::ProcessCompleted { id } => {
                        let finished = scheduler
                            .status(id)
                            .map(|info| info.handle_status == HandleStatus::Finished)
                            .unwrap_or(false);
                        if finished {
                            remaining.remove(&id);
                            scheduler.kill(id)?;
                        }
                    }
                    SchedulerEvent::ProcessFailed { id, cause } => {
                        warn!(id, cause = %cause, "Trial failed; discarding");
                        remaining.remove(&id);
                        scheduler.kill(id)?;
                    }
                    _ => {}
                }
            }
            _ = &mut ctrl_c => {
                warn!(remaining = remaining.len(), "Interrupted; stopping remaining trials");
                break;
            }
        }
    }

    scheduler.shutdown().await;

    let stats = scheduler.stats();
    println!("{}", serde_json::to_string_pretty(&stats).into_diagnostic()?);
    Ok(())
}
