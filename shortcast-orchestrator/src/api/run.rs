//! Run API Handlers
//!
//! HTTP endpoints for run lifecycle, status polling, and the per-gate
//! prompt/resume pairs.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use shortcast_core::domain::gate::{InterruptPayload, ResumePayload};
use shortcast_core::domain::run::PipelineRun;
use shortcast_core::domain::stage::Gate;
use shortcast_core::dto::{
    AudioChoiceRequest, AudioChoiceView, HookPromptRequest, HookPromptView, ResultResponse,
    ResumeResponse, ReviewRequest, ScriptReviewResponse, SpeakerSelectionRequest, SpeakersResponse,
    StartRunRequest, StartRunResponse, StatusResponse, TopicSelectionRequest, TopicsResponse,
};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::engine::RunEngine;

fn resume_response(run: PipelineRun) -> Json<ResumeResponse> {
    Json(ResumeResponse {
        run_id: run.id,
        status: run.status,
    })
}

/// POST /api/v1/pipeline/start
/// Create a run and start it in the background; returns immediately.
pub async fn start_run(
    State(engine): State<Arc<RunEngine>>,
    Json(req): Json<StartRunRequest>,
) -> ApiResult<Json<StartRunResponse>> {
    tracing::info!("Starting pipeline run");

    let run = engine.start_run(req.inputs).await?;

    Ok(Json(StartRunResponse {
        run_id: run.id,
        status: run.status,
    }))
}

/// GET /api/v1/pipeline/{run_id}/status
/// Read-only status snapshot; performs no state mutation.
pub async fn get_status(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<StatusResponse>> {
    tracing::debug!(run_id = %run_id, "Getting run status");

    let run = engine.status(run_id).await?;

    Ok(Json(StatusResponse {
        run_id: run.id,
        status: run.status,
        current_stage: run.current_stage,
        error: run.error,
    }))
}

/// GET /api/v1/pipeline/{run_id}/result
/// Final artifact of a completed run.
pub async fn get_result(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<ResultResponse>> {
    tracing::debug!(run_id = %run_id, "Getting run result");

    let result = engine.result(run_id).await?;
    let run = engine.status(run_id).await?;

    Ok(Json(ResultResponse {
        run_id,
        status: run.status,
        result,
    }))
}

// =============================================================================
// Gate Endpoints
// =============================================================================

/// GET /api/v1/pipeline/{run_id}/topics
pub async fn get_topics(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<TopicsResponse>> {
    let payload = engine.fetch_interrupt(run_id, Gate::TopicSelection).await?;

    match payload {
        InterruptPayload::TopicSelection { topics } => Ok(Json(TopicsResponse {
            run_id,
            status: Gate::TopicSelection.waiting_status(),
            topics,
        })),
        _ => Err(ApiError::InternalError("mismatched interrupt payload".to_string())),
    }
}

/// POST /api/v1/pipeline/{run_id}/topic-selection
pub async fn submit_topic_selection(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
    Json(req): Json<TopicSelectionRequest>,
) -> ApiResult<Json<ResumeResponse>> {
    tracing::info!(run_id = %run_id, topic = %req.selected_topic, "Topic selected");

    let run = engine
        .resume(
            run_id,
            Gate::TopicSelection,
            ResumePayload::TopicSelection {
                selected_topic: req.selected_topic,
            },
        )
        .await?;

    Ok(resume_response(run))
}

/// GET /api/v1/pipeline/{run_id}/speakers
pub async fn get_speakers(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<SpeakersResponse>> {
    let payload = engine.fetch_interrupt(run_id, Gate::SpeakerSelection).await?;

    match payload {
        InterruptPayload::SpeakerSelection { members } => Ok(Json(SpeakersResponse {
            run_id,
            status: Gate::SpeakerSelection.waiting_status(),
            members,
        })),
        _ => Err(ApiError::InternalError("mismatched interrupt payload".to_string())),
    }
}

/// POST /api/v1/pipeline/{run_id}/speaker-selection
pub async fn submit_speaker_selection(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
    Json(req): Json<SpeakerSelectionRequest>,
) -> ApiResult<Json<ResumeResponse>> {
    tracing::info!(
        run_id = %run_id,
        host = %req.host,
        participants = ?req.participants,
        "Speakers selected"
    );

    let run = engine
        .resume(
            run_id,
            Gate::SpeakerSelection,
            ResumePayload::SpeakerSelection {
                host: req.host,
                participants: req.participants,
            },
        )
        .await?;

    Ok(resume_response(run))
}

/// GET /api/v1/pipeline/{run_id}/script
pub async fn get_script(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<ScriptReviewResponse>> {
    let payload = engine.fetch_interrupt(run_id, Gate::Review).await?;

    match payload {
        InterruptPayload::Review { script } => Ok(Json(ScriptReviewResponse {
            run_id,
            status: Gate::Review.waiting_status(),
            script,
        })),
        _ => Err(ApiError::InternalError("mismatched interrupt payload".to_string())),
    }
}

/// POST /api/v1/pipeline/{run_id}/review
pub async fn submit_review(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<ResumeResponse>> {
    tracing::info!(run_id = %run_id, approved = req.approved, "Review submitted");

    let run = engine
        .resume(
            run_id,
            Gate::Review,
            ResumePayload::Review {
                approved: req.approved,
                feedback: req.feedback,
            },
        )
        .await?;

    Ok(resume_response(run))
}

/// GET /api/v1/pipeline/{run_id}/audio-choice
pub async fn get_audio_choice(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<AudioChoiceView>> {
    let payload = engine.fetch_interrupt(run_id, Gate::AudioChoice).await?;

    match payload {
        InterruptPayload::AudioChoice { scenes } => Ok(Json(AudioChoiceView {
            run_id,
            status: Gate::AudioChoice.waiting_status(),
            scenes,
        })),
        _ => Err(ApiError::InternalError("mismatched interrupt payload".to_string())),
    }
}

/// POST /api/v1/pipeline/{run_id}/audio-choice
pub async fn submit_audio_choice(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
    Json(req): Json<AudioChoiceRequest>,
) -> ApiResult<Json<ResumeResponse>> {
    tracing::info!(run_id = %run_id, source = ?req.source, "Audio choice submitted");

    let run = engine
        .resume(
            run_id,
            Gate::AudioChoice,
            ResumePayload::AudioChoice {
                source: req.source,
                files: req.files,
            },
        )
        .await?;

    Ok(resume_response(run))
}

/// GET /api/v1/pipeline/{run_id}/hook-prompt
pub async fn get_hook_prompt(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
) -> ApiResult<Json<HookPromptView>> {
    let payload = engine.fetch_interrupt(run_id, Gate::HookPrompt).await?;

    match payload {
        InterruptPayload::HookPrompt { prompt } => Ok(Json(HookPromptView {
            run_id,
            status: Gate::HookPrompt.waiting_status(),
            prompt,
        })),
        _ => Err(ApiError::InternalError("mismatched interrupt payload".to_string())),
    }
}

/// POST /api/v1/pipeline/{run_id}/hook-prompt
pub async fn submit_hook_prompt(
    State(engine): State<Arc<RunEngine>>,
    Path(run_id): Path<Uuid>,
    Json(req): Json<HookPromptRequest>,
) -> ApiResult<Json<ResumeResponse>> {
    tracing::info!(run_id = %run_id, "Hook prompt submitted");

    let run = engine
        .resume(
            run_id,
            Gate::HookPrompt,
            ResumePayload::HookPrompt { prompt: req.prompt },
        )
        .await?;

    Ok(resume_response(run))
}
