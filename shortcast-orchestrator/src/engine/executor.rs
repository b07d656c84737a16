//! Run executor
//!
//! One background task per active run. The executor advances the stage
//! graph strictly sequentially: persist the stage position, invoke the
//! external worker against a state snapshot, merge the result, continue to
//! the next step. It stops at gates (handing the run to the gate
//! controller) and on terminal states. It is driven by run start and
//! resume events, never by client polling.

use std::sync::Arc;

use shortcast_core::domain::run::{PipelineRun, RunStatus};
use shortcast_core::graph::{self, Step};
use uuid::Uuid;

use crate::engine::{ActiveClaim, RunEngine, RunError};

/// Spawn the stepping task for a claimed run.
///
/// The claim is held for the lifetime of the task; concurrent resume
/// attempts for the same run are rejected until it drops.
pub(crate) fn spawn_advance(engine: Arc<RunEngine>, run_id: Uuid, from: Step, claim: ActiveClaim) {
    tokio::spawn(async move {
        let _claim = claim;
        if let Err(e) = advance(&engine, run_id, from).await {
            tracing::error!(run_id = %run_id, error = %e, "Executor aborted");
            // Best effort: a run left in `Running` with no executor has no
            // forward path, so try to record a terminal state. If the store
            // is still down this loses too, and the run stays resumable
            // once the store recovers.
            if let Err(record) = abort_run(&engine, run_id, e.to_string()).await {
                tracing::error!(run_id = %run_id, error = %record, "Failed to record executor abort");
            }
        }
    });
}

async fn abort_run(engine: &Arc<RunEngine>, run_id: Uuid, error: String) -> Result<(), RunError> {
    let run = engine.fetch_run(run_id).await?;
    if run.status.is_terminal() {
        return Ok(());
    }
    fail_run(engine, run, format!("executor aborted: {}", error)).await
}

async fn advance(engine: &Arc<RunEngine>, run_id: Uuid, mut step: Step) -> Result<(), RunError> {
    loop {
        match step {
            Step::Stage(stage) => {
                let mut run = engine.fetch_run(run_id).await?;
                if run.status.is_terminal() {
                    return Ok(());
                }

                run.current_stage = Some(stage);
                run.touch();
                engine.store().update(&run).await?;

                tracing::info!(run_id = %run_id, stage = %stage, "Stage started");

                // Read-only snapshot; the claim guarantees no other writer
                // touches the run while the worker is in flight.
                match engine.worker().execute(stage, &run.inputs, &run.stage_state).await {
                    Ok(output) if output.stage() == stage => {
                        run.stage_state.apply_output(output);
                        run.touch();
                        engine.store().update(&run).await?;
                        tracing::info!(run_id = %run_id, stage = %stage, "Stage completed");
                        step = graph::after_stage(stage);
                    }
                    Ok(output) => {
                        fail_run(
                            engine,
                            run,
                            format!(
                                "worker returned {} output while executing {}",
                                output.stage(),
                                stage
                            ),
                        )
                        .await?;
                        return Ok(());
                    }
                    Err(e) => {
                        fail_run(engine, run, e.to_string()).await?;
                        return Ok(());
                    }
                }
            }
            Step::Gate(gate) => {
                if let Err(e) = engine.suspend(run_id, gate).await {
                    match e {
                        RunError::Internal(msg) => {
                            let run = engine.fetch_run(run_id).await?;
                            fail_run(engine, run, msg).await?;
                            return Ok(());
                        }
                        other => return Err(other),
                    }
                }
                return Ok(());
            }
            Step::Done => {
                let mut run = engine.fetch_run(run_id).await?;
                if run.status.is_terminal() {
                    return Ok(());
                }
                run.status = RunStatus::Completed;
                run.touch();
                engine.store().update(&run).await?;
                tracing::info!(run_id = %run_id, "Run completed");
                return Ok(());
            }
        }
    }
}

/// Convert a stage failure into the `Failed` terminal state. Runs are never
/// left stuck in `Running` with no forward path.
async fn fail_run(engine: &Arc<RunEngine>, mut run: PipelineRun, error: String) -> Result<(), RunError> {
    tracing::error!(run_id = %run.id, error = %error, "Run failed");
    run.status = RunStatus::Failed;
    run.error = Some(error);
    run.pending_interrupt = None;
    run.touch();
    engine.store().update(&run).await?;
    Ok(())
}
