//! Pipeline run domain types
//!
//! Structure shared between the orchestrator (persists, executes) and the
//! client (polls, renders wizard steps).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::gate::Interrupt;
use crate::domain::stage::{Gate, Stage};
use crate::domain::state::StageState;

/// Run execution status.
///
/// Closed enumeration: `Running`, one waiting-state per gate, and the two
/// absorbing terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    WaitingForTopicSelection,
    WaitingForSpeakerSelection,
    WaitingForReview,
    WaitingForAudioChoice,
    WaitingForHookPrompt,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }

    /// The gate this waiting-state belongs to, if any.
    pub fn gate(&self) -> Option<Gate> {
        match self {
            RunStatus::WaitingForTopicSelection => Some(Gate::TopicSelection),
            RunStatus::WaitingForSpeakerSelection => Some(Gate::SpeakerSelection),
            RunStatus::WaitingForReview => Some(Gate::Review),
            RunStatus::WaitingForAudioChoice => Some(Gate::AudioChoice),
            RunStatus::WaitingForHookPrompt => Some(Gate::HookPrompt),
            _ => None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.gate().is_some()
    }

    /// Wire/storage name for the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::WaitingForTopicSelection => "waiting_for_topic_selection",
            RunStatus::WaitingForSpeakerSelection => "waiting_for_speaker_selection",
            RunStatus::WaitingForReview => "waiting_for_review",
            RunStatus::WaitingForAudioChoice => "waiting_for_audio_choice",
            RunStatus::WaitingForHookPrompt => "waiting_for_hook_prompt",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<RunStatus> {
        match s {
            "running" => Some(RunStatus::Running),
            "waiting_for_topic_selection" => Some(RunStatus::WaitingForTopicSelection),
            "waiting_for_speaker_selection" => Some(RunStatus::WaitingForSpeakerSelection),
            "waiting_for_review" => Some(RunStatus::WaitingForReview),
            "waiting_for_audio_choice" => Some(RunStatus::WaitingForAudioChoice),
            "waiting_for_hook_prompt" => Some(RunStatus::WaitingForHookPrompt),
            "completed" => Some(RunStatus::Completed),
            "failed" => Some(RunStatus::Failed),
            _ => None,
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target output resolution, portrait shorts formats only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoResolution {
    #[serde(rename = "1080x1920")]
    Full,
    #[serde(rename = "720x1280")]
    Reduced,
}

impl Default for VideoResolution {
    fn default() -> Self {
        VideoResolution::Full
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageGenerator {
    Dalle,
    Ideogram,
}

impl Default for ImageGenerator {
    fn default() -> Self {
        ImageGenerator::Dalle
    }
}

/// Inputs supplied at run creation; immutable for the life of the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunInputs {
    /// Category filter for trend research, e.g. "tech".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Free-text topic seed; bypasses category filtering when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default)]
    pub video_resolution: VideoResolution,
    #[serde(default)]
    pub image_generator: ImageGenerator,
}

/// One end-to-end execution of the pipeline.
///
/// Invariants, maintained by the executor and gate controller (the only
/// writers):
/// - `pending_interrupt` is non-null iff `status` is a waiting-state
/// - `error` is non-null iff `status == Failed`
/// - terminal states are absorbing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub status: RunStatus,
    pub current_stage: Option<Stage>,
    pub inputs: RunInputs,
    pub stage_state: StageState,
    pub pending_interrupt: Option<Interrupt>,
    pub error: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PipelineRun {
    /// Create a fresh run positioned at the first stage.
    pub fn new(inputs: RunInputs) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: RunStatus::Running,
            current_stage: Some(Stage::TrendResearch),
            inputs,
            stage_state: StageState::default(),
            pending_interrupt: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updated_at`; call before every persist.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now();
    }
}
