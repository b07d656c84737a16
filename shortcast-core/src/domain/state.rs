//! Accumulated pipeline state
//!
//! `StageState` collects the outputs of every stage and gate decision as the
//! run progresses. Each field is written by exactly one stage or gate and is
//! never overwritten afterwards (the review-rejection loop is the one case
//! where scriptwriting legitimately replaces its own earlier output).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::stage::Stage;

/// One researched topic candidate offered at the topic-selection gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicSummary {
    pub keyword: String,
    pub summary: String,
    /// Origin of the trend signal, e.g. "google_trends", "youtube", "twitter".
    pub source: String,
    pub trending_score: f64,
}

/// Output of the trend-research stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub keywords: Vec<String>,
    pub topic_summaries: Vec<TopicSummary>,
    pub category: String,
}

/// A single scene of the generated script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub scene_id: String,
    pub text: String,
    pub duration_sec: f64,
    pub emotion: String,
    pub image_prompt: String,
    /// Roster key of the speaker delivering this scene.
    pub speaker: String,
}

/// Output of the scriptwriting stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptData {
    pub title: String,
    pub full_script: String,
    pub scenes: Vec<Scene>,
    pub hook: String,
    pub cta: String,
    pub estimated_duration_sec: f64,
}

/// Host/participant selection made at the speaker-selection gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSelection {
    pub host: String,
    pub participants: Vec<String>,
}

/// Audio source choice made at the audio-choice gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioChoice {
    pub source: AudioSource,
    /// scene_id -> uploaded file reference; only present for manual audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioSource {
    Tts,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    pub scene_id: String,
    pub audio_path: String,
    pub duration_sec: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageAsset {
    pub scene_id: String,
    pub image_path: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoClip {
    pub scene_id: String,
    pub video_path: String,
    pub duration_sec: f64,
}

/// Output of the media-production stage.
///
/// `draft_hook_prompt` is the generated hook-video prompt the hook-prompt
/// gate presents for review before the expensive hook render in editing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAssets {
    pub audio_segments: Vec<AudioSegment>,
    pub images: Vec<ImageAsset>,
    pub video_clips: Vec<VideoClip>,
    pub draft_hook_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: String,
}

/// Output of the editing stage; the final artifact of a completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorOutput {
    pub final_video_path: String,
    pub caption_srt_path: String,
    pub thumbnail_path: String,
    pub metadata: VideoMetadata,
    pub duration_sec: f64,
}

/// Successful result of one stage-worker invocation, tagged by stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stage", content = "output", rename_all = "snake_case")]
pub enum StageOutput {
    TrendResearch(TrendData),
    Scriptwriting(ScriptData),
    MediaProduction(MediaAssets),
    Editing(EditorOutput),
}

impl StageOutput {
    /// The stage this output belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            StageOutput::TrendResearch(_) => Stage::TrendResearch,
            StageOutput::Scriptwriting(_) => Stage::Scriptwriting,
            StageOutput::MediaProduction(_) => Stage::MediaProduction,
            StageOutput::Editing(_) => Stage::Editing,
        }
    }
}

/// Accumulated outputs of all stages and gate decisions for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageState {
    pub trend: Option<TrendData>,
    pub selected_topic: Option<String>,
    pub speakers: Option<SpeakerSelection>,
    pub script: Option<ScriptData>,
    /// Rejection feedback history, oldest first. Grows by one entry per
    /// review rejection and feeds back into the scriptwriting snapshot.
    #[serde(default)]
    pub review_feedback: Vec<String>,
    pub audio: Option<AudioChoice>,
    pub media: Option<MediaAssets>,
    pub hook_prompt: Option<String>,
    pub output: Option<EditorOutput>,
}

impl StageState {
    /// Merge a stage worker's output into the state.
    pub fn apply_output(&mut self, output: StageOutput) {
        match output {
            StageOutput::TrendResearch(trend) => self.trend = Some(trend),
            StageOutput::Scriptwriting(script) => self.script = Some(script),
            StageOutput::MediaProduction(media) => self.media = Some(media),
            StageOutput::Editing(out) => self.output = Some(out),
        }
    }
}
