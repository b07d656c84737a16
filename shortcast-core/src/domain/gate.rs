//! Gate payloads and validation
//!
//! Every gate carries two tagged payloads: the prompt (`InterruptPayload`)
//! the orchestrator exposes while suspended, and the resume payload the
//! client submits to continue. One validation rule set exists per tag;
//! validation never mutates run state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::stage::Gate;
use crate::domain::state::{
    AudioChoice, AudioSource, ScriptData, SpeakerSelection, StageState, TopicSummary,
};

/// One selectable speaker presented at the speaker-selection gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerProfile {
    pub key: String,
    pub name: String,
    pub description: String,
    pub photo_url: String,
}

/// Scene reference shown at the audio-choice gate so the user knows which
/// recordings to supply in manual mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneRef {
    pub scene_id: String,
    pub speaker: String,
    pub text: String,
}

/// Prompt payload stored in `pending_interrupt` while a run is suspended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InterruptPayload {
    TopicSelection { topics: Vec<TopicSummary> },
    SpeakerSelection { members: Vec<SpeakerProfile> },
    Review { script: ScriptData },
    AudioChoice { scenes: Vec<SceneRef> },
    HookPrompt { prompt: String },
}

impl InterruptPayload {
    pub fn gate(&self) -> Gate {
        match self {
            InterruptPayload::TopicSelection { .. } => Gate::TopicSelection,
            InterruptPayload::SpeakerSelection { .. } => Gate::SpeakerSelection,
            InterruptPayload::Review { .. } => Gate::Review,
            InterruptPayload::AudioChoice { .. } => Gate::AudioChoice,
            InterruptPayload::HookPrompt { .. } => Gate::HookPrompt,
        }
    }
}

/// The recorded suspension of a run at a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    pub gate: Gate,
    pub payload: InterruptPayload,
}

/// Externally supplied decision that satisfies a gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResumePayload {
    TopicSelection {
        selected_topic: String,
    },
    SpeakerSelection {
        host: String,
        participants: Vec<String>,
    },
    Review {
        approved: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feedback: Option<String>,
    },
    AudioChoice {
        source: AudioSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        files: Option<HashMap<String, String>>,
    },
    HookPrompt {
        prompt: String,
    },
}

/// Gate validation failure; the run is left untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(pub String);

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ValidationError {}

impl ResumePayload {
    pub fn gate(&self) -> Gate {
        match self {
            ResumePayload::TopicSelection { .. } => Gate::TopicSelection,
            ResumePayload::SpeakerSelection { .. } => Gate::SpeakerSelection,
            ResumePayload::Review { .. } => Gate::Review,
            ResumePayload::AudioChoice { .. } => Gate::AudioChoice,
            ResumePayload::HookPrompt { .. } => Gate::HookPrompt,
        }
    }

    /// Validate this payload against the interrupt it answers.
    pub fn validate(&self, interrupt: &InterruptPayload) -> Result<(), ValidationError> {
        match (self, interrupt) {
            (
                ResumePayload::TopicSelection { selected_topic },
                InterruptPayload::TopicSelection { topics },
            ) => {
                if !topics.iter().any(|t| t.keyword == *selected_topic) {
                    return Err(ValidationError(format!(
                        "selected topic '{}' is not among the offered candidates",
                        selected_topic
                    )));
                }
                Ok(())
            }
            (
                ResumePayload::SpeakerSelection { host, participants },
                InterruptPayload::SpeakerSelection { members },
            ) => {
                let known = |key: &str| members.iter().any(|m| m.key == key);
                if !known(host) {
                    return Err(ValidationError(format!("unknown host '{}'", host)));
                }
                if participants.is_empty() {
                    return Err(ValidationError(
                        "at least one participant must be selected".to_string(),
                    ));
                }
                for p in participants {
                    if !known(p) {
                        return Err(ValidationError(format!("unknown participant '{}'", p)));
                    }
                }
                if participants.iter().any(|p| p == host) {
                    return Err(ValidationError(
                        "host cannot also be a participant".to_string(),
                    ));
                }
                let mut seen = std::collections::HashSet::new();
                for p in participants {
                    if !seen.insert(p.as_str()) {
                        return Err(ValidationError(format!("duplicate participant '{}'", p)));
                    }
                }
                Ok(())
            }
            (ResumePayload::Review { approved, feedback }, InterruptPayload::Review { .. }) => {
                if !approved && feedback.as_deref().map_or(true, |f| f.trim().is_empty()) {
                    return Err(ValidationError(
                        "rejection requires non-empty feedback".to_string(),
                    ));
                }
                Ok(())
            }
            (
                ResumePayload::AudioChoice { source, files },
                InterruptPayload::AudioChoice { scenes },
            ) => match source {
                AudioSource::Tts => {
                    if files.is_some() {
                        return Err(ValidationError(
                            "audio files are only accepted with manual source".to_string(),
                        ));
                    }
                    Ok(())
                }
                AudioSource::Manual => {
                    let files = files.as_ref().ok_or_else(|| {
                        ValidationError("manual source requires audio files".to_string())
                    })?;
                    for scene in scenes {
                        if !files.contains_key(&scene.scene_id) {
                            return Err(ValidationError(format!(
                                "missing audio file for scene '{}'",
                                scene.scene_id
                            )));
                        }
                    }
                    for scene_id in files.keys() {
                        if !scenes.iter().any(|s| s.scene_id == *scene_id) {
                            return Err(ValidationError(format!(
                                "unknown scene '{}' in audio files",
                                scene_id
                            )));
                        }
                    }
                    Ok(())
                }
            },
            (ResumePayload::HookPrompt { prompt }, InterruptPayload::HookPrompt { .. }) => {
                if prompt.trim().is_empty() {
                    return Err(ValidationError("hook prompt cannot be empty".to_string()));
                }
                Ok(())
            }
            _ => Err(ValidationError(format!(
                "payload for gate '{}' does not answer gate '{}'",
                self.gate(),
                interrupt.gate()
            ))),
        }
    }

    /// Merge an already-validated payload into the accumulated state.
    pub fn apply_to(&self, state: &mut StageState) {
        match self {
            ResumePayload::TopicSelection { selected_topic } => {
                state.selected_topic = Some(selected_topic.clone());
            }
            ResumePayload::SpeakerSelection { host, participants } => {
                state.speakers = Some(SpeakerSelection {
                    host: host.clone(),
                    participants: participants.clone(),
                });
            }
            ResumePayload::Review { approved, feedback } => {
                if !approved {
                    if let Some(feedback) = feedback {
                        state.review_feedback.push(feedback.clone());
                    }
                }
            }
            ResumePayload::AudioChoice { source, files } => {
                state.audio = Some(AudioChoice {
                    source: *source,
                    files: files.clone(),
                });
            }
            ResumePayload::HookPrompt { prompt } => {
                state.hook_prompt = Some(prompt.clone());
            }
        }
    }
}
