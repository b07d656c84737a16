//! Run-related API endpoints

use crate::PipelineClient;
use crate::error::Result;
use shortcast_core::dto::{
    AudioChoiceRequest, AudioChoiceView, HookPromptRequest, HookPromptView, ResultResponse,
    ResumeResponse, ReviewRequest, ScriptReviewResponse, SpeakerSelectionRequest, SpeakersResponse,
    StartRunRequest, StartRunResponse, StatusResponse, TopicSelectionRequest, TopicsResponse,
};
use uuid::Uuid;

impl PipelineClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Start a new pipeline run
    ///
    /// Returns immediately with the run id; the pipeline executes in the
    /// background and suspends at the first decision gate.
    pub async fn start_run(&self, req: StartRunRequest) -> Result<StartRunResponse> {
        let url = format!("{}/api/v1/pipeline/start", self.base_url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get the current status of a run
    ///
    /// Read-only; safe to poll at any frequency.
    pub async fn get_status(&self, run_id: Uuid) -> Result<StatusResponse> {
        let url = format!("{}/api/v1/pipeline/{}/status", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get the final output of a completed run
    ///
    /// Returns a conflict error if the run has not completed yet.
    pub async fn get_result(&self, run_id: Uuid) -> Result<ResultResponse> {
        let url = format!("{}/api/v1/pipeline/{}/result", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Decision Gates
    // =============================================================================

    /// Get the researched topics offered at the topic-selection gate
    pub async fn get_topics(&self, run_id: Uuid) -> Result<TopicsResponse> {
        let url = format!("{}/api/v1/pipeline/{}/topics", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Submit the chosen topic and resume the run
    pub async fn submit_topic_selection(
        &self,
        run_id: Uuid,
        req: TopicSelectionRequest,
    ) -> Result<ResumeResponse> {
        let url = format!("{}/api/v1/pipeline/{}/topic-selection", self.base_url, run_id);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get the speaker roster offered at the speaker-selection gate
    pub async fn get_speakers(&self, run_id: Uuid) -> Result<SpeakersResponse> {
        let url = format!("{}/api/v1/pipeline/{}/speakers", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Submit the host and participant choices and resume the run
    pub async fn submit_speaker_selection(
        &self,
        run_id: Uuid,
        req: SpeakerSelectionRequest,
    ) -> Result<ResumeResponse> {
        let url = format!(
            "{}/api/v1/pipeline/{}/speaker-selection",
            self.base_url, run_id
        );
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get the draft script awaiting review
    pub async fn get_script(&self, run_id: Uuid) -> Result<ScriptReviewResponse> {
        let url = format!("{}/api/v1/pipeline/{}/script", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Approve or reject the script; rejection requires feedback and loops
    /// the run back through scriptwriting
    pub async fn submit_review(&self, run_id: Uuid, req: ReviewRequest) -> Result<ResumeResponse> {
        let url = format!("{}/api/v1/pipeline/{}/review", self.base_url, run_id);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get the scene list awaiting an audio-source decision
    pub async fn get_audio_choice(&self, run_id: Uuid) -> Result<AudioChoiceView> {
        let url = format!("{}/api/v1/pipeline/{}/audio-choice", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Submit the audio-source decision and resume the run
    pub async fn submit_audio_choice(
        &self,
        run_id: Uuid,
        req: AudioChoiceRequest,
    ) -> Result<ResumeResponse> {
        let url = format!("{}/api/v1/pipeline/{}/audio-choice", self.base_url, run_id);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get the draft hook prompt awaiting confirmation or edit
    pub async fn get_hook_prompt(&self, run_id: Uuid) -> Result<HookPromptView> {
        let url = format!("{}/api/v1/pipeline/{}/hook-prompt", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Submit the final hook prompt and resume the run
    pub async fn submit_hook_prompt(
        &self,
        run_id: Uuid,
        req: HookPromptRequest,
    ) -> Result<ResumeResponse> {
        let url = format!("{}/api/v1/pipeline/{}/hook-prompt", self.base_url, run_id);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }
}
