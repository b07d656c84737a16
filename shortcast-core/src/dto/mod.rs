//! Data Transfer Objects for the orchestrator HTTP API
//!
//! Request and response bodies exchanged between the orchestrator and the
//! wizard client. Gate GET responses carry the gate's prompt payload; gate
//! POST requests carry the resume payload fields for that gate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::gate::{SceneRef, SpeakerProfile};
use crate::domain::run::{RunInputs, RunStatus};
use crate::domain::stage::Stage;
use crate::domain::state::{AudioSource, EditorOutput, ScriptData, TopicSummary};

/// POST /start request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRunRequest {
    #[serde(flatten)]
    pub inputs: RunInputs,
}

/// POST /start response; returned immediately, before the pipeline finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRunResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
}

/// GET /{run_id}/status response. Read-only; never mutates the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<Stage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response common to every gate POST: the run's state once the resume
/// payload has been applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
}

/// GET /{run_id}/topics response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub topics: Vec<TopicSummary>,
}

/// POST /{run_id}/topic-selection request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSelectionRequest {
    pub selected_topic: String,
}

/// GET /{run_id}/speakers response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakersResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub members: Vec<SpeakerProfile>,
}

/// POST /{run_id}/speaker-selection request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerSelectionRequest {
    pub host: String,
    pub participants: Vec<String>,
}

/// GET /{run_id}/script response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptReviewResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub script: ScriptData,
}

/// POST /{run_id}/review request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRequest {
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// GET /{run_id}/audio-choice response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioChoiceView {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub scenes: Vec<SceneRef>,
}

/// POST /{run_id}/audio-choice request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioChoiceRequest {
    pub source: AudioSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<HashMap<String, String>>,
}

/// GET /{run_id}/hook-prompt response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookPromptView {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub prompt: String,
}

/// POST /{run_id}/hook-prompt request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookPromptRequest {
    pub prompt: String,
}

/// GET /{run_id}/result response; only valid once the run completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
    pub result: EditorOutput,
}
