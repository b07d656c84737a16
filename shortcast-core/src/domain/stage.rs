//! Stage and gate identifiers
//!
//! The pipeline is a fixed sequence of worker stages with human-decision
//! gates between them. Both enums are closed: adding a stage or gate means
//! extending the graph in `crate::graph` as well.

use serde::{Deserialize, Serialize};

use crate::domain::run::RunStatus;

/// A unit of pipeline work performed by an external stage worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TrendResearch,
    Scriptwriting,
    MediaProduction,
    Editing,
}

impl Stage {
    /// Wire/storage name for the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::TrendResearch => "trend_research",
            Stage::Scriptwriting => "scriptwriting",
            Stage::MediaProduction => "media_production",
            Stage::Editing => "editing",
        }
    }

    pub fn from_str(s: &str) -> Option<Stage> {
        match s {
            "trend_research" => Some(Stage::TrendResearch),
            "scriptwriting" => Some(Stage::Scriptwriting),
            "media_production" => Some(Stage::MediaProduction),
            "editing" => Some(Stage::Editing),
            _ => None,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named suspension point where the run waits for an external decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    TopicSelection,
    SpeakerSelection,
    Review,
    AudioChoice,
    HookPrompt,
}

impl Gate {
    /// Wire/storage name for the gate.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gate::TopicSelection => "topic_selection",
            Gate::SpeakerSelection => "speaker_selection",
            Gate::Review => "review",
            Gate::AudioChoice => "audio_choice",
            Gate::HookPrompt => "hook_prompt",
        }
    }

    pub fn from_str(s: &str) -> Option<Gate> {
        match s {
            "topic_selection" => Some(Gate::TopicSelection),
            "speaker_selection" => Some(Gate::SpeakerSelection),
            "review" => Some(Gate::Review),
            "audio_choice" => Some(Gate::AudioChoice),
            "hook_prompt" => Some(Gate::HookPrompt),
            _ => None,
        }
    }

    /// The waiting-state a run enters while suspended at this gate.
    pub fn waiting_status(&self) -> RunStatus {
        match self {
            Gate::TopicSelection => RunStatus::WaitingForTopicSelection,
            Gate::SpeakerSelection => RunStatus::WaitingForSpeakerSelection,
            Gate::Review => RunStatus::WaitingForReview,
            Gate::AudioChoice => RunStatus::WaitingForAudioChoice,
            Gate::HookPrompt => RunStatus::WaitingForHookPrompt,
        }
    }
}

impl std::fmt::Display for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_name_round_trip() {
        for stage in [
            Stage::TrendResearch,
            Stage::Scriptwriting,
            Stage::MediaProduction,
            Stage::Editing,
        ] {
            assert_eq!(Stage::from_str(stage.as_str()), Some(stage));
        }
        assert_eq!(Stage::from_str("unknown"), None);
    }

    #[test]
    fn test_gate_name_round_trip() {
        for gate in [
            Gate::TopicSelection,
            Gate::SpeakerSelection,
            Gate::Review,
            Gate::AudioChoice,
            Gate::HookPrompt,
        ] {
            assert_eq!(Gate::from_str(gate.as_str()), Some(gate));
        }
        assert_eq!(Gate::from_str("unknown"), None);
    }

    #[test]
    fn test_each_gate_has_distinct_waiting_status() {
        let statuses = [
            Gate::TopicSelection.waiting_status(),
            Gate::SpeakerSelection.waiting_status(),
            Gate::Review.waiting_status(),
            Gate::AudioChoice.waiting_status(),
            Gate::HookPrompt.waiting_status(),
        ];
        for (i, a) in statuses.iter().enumerate() {
            for (j, b) in statuses.iter().enumerate() {
                assert_eq!(i == j, a == b);
            }
        }
    }
}
