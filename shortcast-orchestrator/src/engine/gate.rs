//! Gate controller
//!
//! Suspend/resume for named checkpoints. `suspend` records the gate's
//! prompt payload and parks the run in the gate's waiting-state; `resume`
//! validates the submitted decision against the recorded prompt, merges it,
//! and restarts the executor from the step the graph routes to.

use std::sync::Arc;

use shortcast_core::domain::gate::{Interrupt, InterruptPayload, ResumePayload, SceneRef, SpeakerProfile};
use shortcast_core::domain::run::{PipelineRun, RunStatus};
use shortcast_core::domain::stage::Gate;
use shortcast_core::graph;
use uuid::Uuid;

use crate::engine::{RunEngine, RunError, executor};

impl RunEngine {
    /// Park the run at `gate`, recording the prompt payload the client will
    /// fetch. Called by the executor only.
    pub(crate) async fn suspend(&self, run_id: Uuid, gate: Gate) -> Result<(), RunError> {
        let mut run = self.fetch_run(run_id).await?;
        if run.status.is_terminal() {
            return Ok(());
        }

        let payload = build_prompt(gate, &run, self.roster())?;
        run.status = gate.waiting_status();
        run.pending_interrupt = Some(Interrupt { gate, payload });
        run.touch();
        self.store().update(&run).await?;

        tracing::info!(run_id = %run_id, gate = %gate, "Run suspended at gate");
        Ok(())
    }

    /// The prompt payload recorded at `gate`, valid only while the run is
    /// in that gate's waiting-state.
    pub async fn fetch_interrupt(
        &self,
        run_id: Uuid,
        gate: Gate,
    ) -> Result<InterruptPayload, RunError> {
        let run = self.fetch_run(run_id).await?;
        if run.status != gate.waiting_status() {
            return Err(RunError::OrderingViolation(format!(
                "run {} is not waiting for {} (status: {})",
                run_id, gate, run.status
            )));
        }

        let interrupt = run.pending_interrupt.ok_or_else(|| {
            RunError::Internal(format!("run {} is waiting without an interrupt", run_id))
        })?;

        Ok(interrupt.payload)
    }

    /// Apply an external decision to a suspended run and restart its
    /// executor. Validation failures and ordering violations leave the run
    /// untouched.
    pub async fn resume(
        self: &Arc<Self>,
        run_id: Uuid,
        gate: Gate,
        payload: ResumePayload,
    ) -> Result<PipelineRun, RunError> {
        // Claim first: a resume racing an in-flight executor (or another
        // resume) is rejected, not queued.
        let claim = self.claim(run_id).ok_or(RunError::RunBusy(run_id))?;

        let mut run = self.fetch_run(run_id).await?;
        if run.status != gate.waiting_status() {
            return Err(RunError::OrderingViolation(format!(
                "run {} is not waiting for {} (status: {})",
                run_id, gate, run.status
            )));
        }

        let interrupt = run.pending_interrupt.as_ref().ok_or_else(|| {
            RunError::Internal(format!("run {} is waiting without an interrupt", run_id))
        })?;
        payload.validate(&interrupt.payload)?;

        payload.apply_to(&mut run.stage_state);
        run.pending_interrupt = None;
        run.status = RunStatus::Running;
        run.touch();
        self.store().update(&run).await?;

        tracing::info!(run_id = %run_id, gate = %gate, "Gate resumed");

        let next = graph::after_gate(gate, payload.outcome());
        executor::spawn_advance(Arc::clone(self), run_id, next, claim);

        Ok(run)
    }
}

/// Build the prompt payload a gate presents, from the accumulated state.
fn build_prompt(
    gate: Gate,
    run: &PipelineRun,
    roster: &[SpeakerProfile],
) -> Result<InterruptPayload, RunError> {
    let missing = |what: &str| {
        RunError::Internal(format!(
            "cannot suspend run {} at {}: no {} in state",
            run.id, gate, what
        ))
    };

    match gate {
        Gate::TopicSelection => {
            let trend = run.stage_state.trend.as_ref().ok_or_else(|| missing("trend data"))?;
            Ok(InterruptPayload::TopicSelection {
                topics: trend.topic_summaries.clone(),
            })
        }
        Gate::SpeakerSelection => Ok(InterruptPayload::SpeakerSelection {
            members: roster.to_vec(),
        }),
        Gate::Review => {
            let script = run.stage_state.script.as_ref().ok_or_else(|| missing("script"))?;
            Ok(InterruptPayload::Review {
                script: script.clone(),
            })
        }
        Gate::AudioChoice => {
            let script = run.stage_state.script.as_ref().ok_or_else(|| missing("script"))?;
            Ok(InterruptPayload::AudioChoice {
                scenes: script
                    .scenes
                    .iter()
                    .map(|s| SceneRef {
                        scene_id: s.scene_id.clone(),
                        speaker: s.speaker.clone(),
                        text: s.text.clone(),
                    })
                    .collect(),
            })
        }
        Gate::HookPrompt => {
            let media = run.stage_state.media.as_ref().ok_or_else(|| missing("media assets"))?;
            Ok(InterruptPayload::HookPrompt {
                prompt: media.draft_hook_prompt.clone(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::engine::tests::{sample_script, sample_trend};
    use shortcast_core::domain::run::RunInputs;

    fn run_with_state() -> PipelineRun {
        let mut run = PipelineRun::new(RunInputs::default());
        run.stage_state.trend = Some(sample_trend());
        run.stage_state.script = Some(sample_script());
        run
    }

    #[test]
    fn test_prompts_derived_from_state() {
        let run = run_with_state();
        let roster = config::default_roster();

        match build_prompt(Gate::TopicSelection, &run, &roster).unwrap() {
            InterruptPayload::TopicSelection { topics } => assert_eq!(topics.len(), 2),
            other => panic!("unexpected prompt: {:?}", other),
        }

        match build_prompt(Gate::SpeakerSelection, &run, &roster).unwrap() {
            InterruptPayload::SpeakerSelection { members } => {
                assert_eq!(members.len(), roster.len())
            }
            other => panic!("unexpected prompt: {:?}", other),
        }

        match build_prompt(Gate::AudioChoice, &run, &roster).unwrap() {
            InterruptPayload::AudioChoice { scenes } => {
                assert_eq!(scenes.len(), 3);
                assert_eq!(scenes[0].scene_id, "hook");
            }
            other => panic!("unexpected prompt: {:?}", other),
        }
    }

    #[test]
    fn test_prompt_with_missing_prerequisite_is_internal_error() {
        let run = PipelineRun::new(RunInputs::default());
        let roster = config::default_roster();
        let err = build_prompt(Gate::TopicSelection, &run, &roster).unwrap_err();
        assert!(matches!(err, RunError::Internal(_)));
        let err = build_prompt(Gate::HookPrompt, &run, &roster).unwrap_err();
        assert!(matches!(err, RunError::Internal(_)));
    }
}
