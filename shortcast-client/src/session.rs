//! Run session
//!
//! A high-level driver for the gate wizard: starts a run, waits for it to
//! reach a decision gate, surfaces the gate's prompt as a [`SessionEvent`],
//! and submits decisions back. Keeps the poller's handled-status marker in
//! sync so a just-answered gate is never re-surfaced.

use std::collections::HashMap;

use shortcast_core::domain::gate::{SceneRef, SpeakerProfile};
use shortcast_core::domain::run::{RunInputs, RunStatus};
use shortcast_core::domain::stage::Gate;
use shortcast_core::domain::state::{AudioSource, EditorOutput, ScriptData, TopicSummary};
use shortcast_core::dto::{
    AudioChoiceRequest, HookPromptRequest, ReviewRequest, SpeakerSelectionRequest,
    StartRunRequest, TopicSelectionRequest,
};
use tracing::info;
use uuid::Uuid;

use crate::PipelineClient;
use crate::error::{ClientError, Result};
use crate::poller::{PollOutcome, StatusPoller};

/// What the run needs from the user next, or how it ended.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Pick one of the researched topics.
    NeedsTopic { topics: Vec<TopicSummary> },
    /// Pick a host and participants from the roster.
    NeedsSpeakers { members: Vec<SpeakerProfile> },
    /// Approve the draft script or reject it with feedback.
    NeedsReview { script: ScriptData },
    /// Choose TTS or supply an audio file per scene.
    NeedsAudioChoice { scenes: Vec<SceneRef> },
    /// Confirm or edit the draft hook image prompt.
    NeedsHookPrompt { prompt: String },
    /// The run finished; here is the final output.
    Completed { result: EditorOutput },
    /// The run failed and will not continue.
    Failed { error: String },
    /// No transition within the wait window. The run is still executing;
    /// call [`RunSession::next_event`] again to keep waiting, or
    /// [`RunSession::restart`] to abandon it.
    TimedOut,
}

/// Drives a single pipeline run through its decision gates.
pub struct RunSession {
    client: PipelineClient,
    poller: StatusPoller<PipelineClient>,
    run_id: Uuid,
    inputs: RunInputs,
}

impl RunSession {
    /// Start a new run and return a session tracking it.
    pub async fn start(client: PipelineClient, inputs: RunInputs) -> Result<Self> {
        let response = client
            .start_run(StartRunRequest {
                inputs: inputs.clone(),
            })
            .await?;
        info!(run_id = %response.run_id, "Started pipeline run");

        let poller = StatusPoller::new(client.clone());
        Ok(Self {
            client,
            poller,
            run_id: response.run_id,
            inputs,
        })
    }

    /// Attach to an already-running run instead of starting a fresh one.
    pub fn attach(client: PipelineClient, run_id: Uuid, inputs: RunInputs) -> Self {
        let poller = StatusPoller::new(client.clone());
        Self {
            client,
            poller,
            run_id,
            inputs,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Wait for the next actionable state and fetch its prompt.
    ///
    /// Returns [`SessionEvent::TimedOut`] when the wait window elapses;
    /// calling again waits a fresh window on the same run.
    pub async fn next_event(&mut self) -> Result<SessionEvent> {
        let response = match self.poller.wait_for_transition(self.run_id).await? {
            PollOutcome::TimedOut => return Ok(SessionEvent::TimedOut),
            PollOutcome::Transition(response) => response,
        };

        match response.status {
            RunStatus::WaitingForTopicSelection => {
                let view = self.client.get_topics(self.run_id).await?;
                Ok(SessionEvent::NeedsTopic {
                    topics: view.topics,
                })
            }
            RunStatus::WaitingForSpeakerSelection => {
                let view = self.client.get_speakers(self.run_id).await?;
                Ok(SessionEvent::NeedsSpeakers {
                    members: view.members,
                })
            }
            RunStatus::WaitingForReview => {
                let view = self.client.get_script(self.run_id).await?;
                Ok(SessionEvent::NeedsReview {
                    script: view.script,
                })
            }
            RunStatus::WaitingForAudioChoice => {
                let view = self.client.get_audio_choice(self.run_id).await?;
                Ok(SessionEvent::NeedsAudioChoice {
                    scenes: view.scenes,
                })
            }
            RunStatus::WaitingForHookPrompt => {
                let view = self.client.get_hook_prompt(self.run_id).await?;
                Ok(SessionEvent::NeedsHookPrompt {
                    prompt: view.prompt,
                })
            }
            RunStatus::Completed => {
                let view = self.client.get_result(self.run_id).await?;
                Ok(SessionEvent::Completed {
                    result: view.result,
                })
            }
            RunStatus::Failed => Ok(SessionEvent::Failed {
                error: response
                    .error
                    .unwrap_or_else(|| "pipeline failed without a recorded error".to_string()),
            }),
            RunStatus::Running => Err(ClientError::UnexpectedState(
                "poller surfaced a running status".to_string(),
            )),
        }
    }

    /// Keep waiting on the same run after a timeout. The wait window is
    /// armed per call, so this is a fresh full window.
    pub async fn extend(&mut self) -> Result<SessionEvent> {
        self.next_event().await
    }

    /// Abandon the current run and start a fresh one with the same inputs.
    ///
    /// The abandoned run keeps executing server-side until it next suspends;
    /// this session simply stops tracking it.
    pub async fn restart(&mut self) -> Result<Uuid> {
        let response = self
            .client
            .start_run(StartRunRequest {
                inputs: self.inputs.clone(),
            })
            .await?;
        info!(
            old_run_id = %self.run_id,
            new_run_id = %response.run_id,
            "Restarted pipeline run"
        );
        self.run_id = response.run_id;
        self.poller.reset();
        Ok(self.run_id)
    }

    // =============================================================================
    // Gate Submissions
    // =============================================================================

    /// Submit the chosen topic.
    pub async fn submit_topic(&mut self, selected_topic: impl Into<String>) -> Result<()> {
        self.client
            .submit_topic_selection(
                self.run_id,
                TopicSelectionRequest {
                    selected_topic: selected_topic.into(),
                },
            )
            .await?;
        self.poller.mark_handled(Gate::TopicSelection.waiting_status());
        Ok(())
    }

    /// Submit the host and participant choices.
    pub async fn submit_speakers(
        &mut self,
        host: impl Into<String>,
        participants: Vec<String>,
    ) -> Result<()> {
        self.client
            .submit_speaker_selection(
                self.run_id,
                SpeakerSelectionRequest {
                    host: host.into(),
                    participants,
                },
            )
            .await?;
        self.poller
            .mark_handled(Gate::SpeakerSelection.waiting_status());
        Ok(())
    }

    /// Approve the script, or reject it with feedback to trigger a rewrite.
    pub async fn submit_review(&mut self, approved: bool, feedback: Option<String>) -> Result<()> {
        self.client
            .submit_review(self.run_id, ReviewRequest { approved, feedback })
            .await?;
        self.poller.mark_handled(Gate::Review.waiting_status());
        Ok(())
    }

    /// Submit the audio-source decision. `files` maps scene ids to uploaded
    /// audio paths and is required for manual audio.
    pub async fn submit_audio_choice(
        &mut self,
        source: AudioSource,
        files: Option<HashMap<String, String>>,
    ) -> Result<()> {
        self.client
            .submit_audio_choice(self.run_id, AudioChoiceRequest { source, files })
            .await?;
        self.poller.mark_handled(Gate::AudioChoice.waiting_status());
        Ok(())
    }

    /// Submit the final hook image prompt.
    pub async fn submit_hook_prompt(&mut self, prompt: impl Into<String>) -> Result<()> {
        self.client
            .submit_hook_prompt(
                self.run_id,
                HookPromptRequest {
                    prompt: prompt.into(),
                },
            )
            .await?;
        self.poller.mark_handled(Gate::HookPrompt.waiting_status());
        Ok(())
    }
}
