//! Run engine
//!
//! Owns run creation, the per-run active-executor registry, and the
//! read-side queries (status, result). The gate controller lives in
//! `gate`, the stage-stepping loop in `executor`, the worker boundary in
//! `worker`.

pub mod executor;
pub mod gate;
pub mod worker;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use shortcast_core::domain::gate::{SpeakerProfile, ValidationError};
use shortcast_core::domain::run::{PipelineRun, RunInputs, RunStatus};
use shortcast_core::domain::state::EditorOutput;
use shortcast_core::graph;
use uuid::Uuid;

use crate::store::{RunStore, StoreError};
use crate::engine::worker::StageWorker;

/// Service error type
#[derive(Debug)]
pub enum RunError {
    NotFound(Uuid),
    /// Malformed or out-of-range resume payload; run state unchanged.
    Validation(String),
    /// Fetch or resume attempted while the run is not in the matching state.
    OrderingViolation(String),
    /// An executor or resume is already in flight for this run.
    RunBusy(Uuid),
    /// Result requested before the run completed.
    NotCompleted(Uuid),
    /// Engine invariant breach (e.g. a waiting run without an interrupt).
    Internal(String),
    Store(StoreError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunError::NotFound(id) => write!(f, "run {} not found", id),
            RunError::Validation(msg) => write!(f, "validation error: {}", msg),
            RunError::OrderingViolation(msg) => write!(f, "ordering violation: {}", msg),
            RunError::RunBusy(id) => write!(f, "run {} is busy", id),
            RunError::NotCompleted(id) => write!(f, "run {} has not completed", id),
            RunError::Internal(msg) => write!(f, "internal error: {}", msg),
            RunError::Store(err) => write!(f, "store error: {}", err),
        }
    }
}

impl std::error::Error for RunError {}

impl From<StoreError> for RunError {
    fn from(err: StoreError) -> Self {
        RunError::Store(err)
    }
}

impl From<ValidationError> for RunError {
    fn from(err: ValidationError) -> Self {
        RunError::Validation(err.0)
    }
}

/// Registry of runs with an in-flight executor or resume.
///
/// At most one active executor per run id; a concurrent claim is rejected,
/// never queued.
#[derive(Default)]
struct ActiveRuns(Mutex<HashSet<Uuid>>);

impl ActiveRuns {
    fn try_claim(self: &Arc<Self>, id: Uuid) -> Option<ActiveClaim> {
        let mut active = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if active.insert(id) {
            Some(ActiveClaim {
                registry: Arc::clone(self),
                id,
            })
        } else {
            None
        }
    }
}

/// Exclusive claim on a run id; released on drop.
pub(crate) struct ActiveClaim {
    registry: Arc<ActiveRuns>,
    id: Uuid,
}

impl Drop for ActiveClaim {
    fn drop(&mut self) {
        let mut active = self.registry.0.lock().unwrap_or_else(|e| e.into_inner());
        active.remove(&self.id);
    }
}

/// The orchestration core: run store + stage worker + gate roster.
pub struct RunEngine {
    store: Arc<dyn RunStore>,
    worker: Arc<dyn StageWorker>,
    roster: Vec<SpeakerProfile>,
    active: Arc<ActiveRuns>,
}

impl RunEngine {
    pub fn new(
        store: Arc<dyn RunStore>,
        worker: Arc<dyn StageWorker>,
        roster: Vec<SpeakerProfile>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            worker,
            roster,
            active: Arc::new(ActiveRuns::default()),
        })
    }

    /// Create a run and start its executor in the background.
    ///
    /// Returns as soon as the run is persisted; the caller polls for
    /// progress.
    pub async fn start_run(self: &Arc<Self>, inputs: RunInputs) -> Result<PipelineRun, RunError> {
        let run = PipelineRun::new(inputs);
        self.store.insert(&run).await?;

        let claim = self
            .active
            .try_claim(run.id)
            .ok_or(RunError::RunBusy(run.id))?;

        tracing::info!(run_id = %run.id, "Run created");
        executor::spawn_advance(Arc::clone(self), run.id, graph::entry(), claim);

        Ok(run)
    }

    /// Fetch a run, converting a missing id into `NotFound`.
    pub async fn fetch_run(&self, id: Uuid) -> Result<PipelineRun, RunError> {
        self.store.fetch(id).await?.ok_or(RunError::NotFound(id))
    }

    /// Read-only status snapshot; never mutates the run.
    pub async fn status(&self, id: Uuid) -> Result<PipelineRun, RunError> {
        self.fetch_run(id).await
    }

    /// Final artifact of a completed run.
    pub async fn result(&self, id: Uuid) -> Result<EditorOutput, RunError> {
        let run = self.fetch_run(id).await?;
        if run.status != RunStatus::Completed {
            return Err(RunError::NotCompleted(id));
        }
        run.stage_state
            .output
            .ok_or_else(|| RunError::Internal(format!("completed run {} has no output", id)))
    }

    pub(crate) fn roster(&self) -> &[SpeakerProfile] {
        &self.roster
    }

    pub(crate) fn store(&self) -> &Arc<dyn RunStore> {
        &self.store
    }

    pub(crate) fn worker(&self) -> &Arc<dyn StageWorker> {
        &self.worker
    }

    pub(crate) fn claim(&self, id: Uuid) -> Option<ActiveClaim> {
        self.active.try_claim(id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use shortcast_core::domain::gate::{ResumePayload, SceneRef};
    use shortcast_core::domain::stage::{Gate, Stage};
    use shortcast_core::domain::state::{
        AudioSource, EditorOutput, MediaAssets, Scene, ScriptData, StageOutput, StageState,
        TopicSummary, TrendData, VideoMetadata,
    };
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::config;
    use crate::engine::worker::{StageWorker, WorkerError};
    use crate::store::MemoryRunStore;

    /// Worker returning canned outputs, with optional per-stage failure and
    /// a configurable delay to simulate slow generation.
    pub(crate) struct ScriptedWorker {
        pub fail_at: Option<Stage>,
        pub delay: Duration,
    }

    impl ScriptedWorker {
        pub fn instant() -> Self {
            Self {
                fail_at: None,
                delay: Duration::ZERO,
            }
        }
    }

    pub(crate) fn sample_trend() -> TrendData {
        TrendData {
            keywords: vec!["ai".to_string(), "space".to_string()],
            topic_summaries: vec![
                TopicSummary {
                    keyword: "ai".to_string(),
                    summary: "AI everywhere".to_string(),
                    source: "google_trends".to_string(),
                    trending_score: 0.92,
                },
                TopicSummary {
                    keyword: "space".to_string(),
                    summary: "New launch window".to_string(),
                    source: "youtube".to_string(),
                    trending_score: 0.71,
                },
            ],
            category: "tech".to_string(),
        }
    }

    pub(crate) fn sample_script() -> ScriptData {
        let scene = |id: &str, speaker: &str| Scene {
            scene_id: id.to_string(),
            text: format!("line for {}", id),
            duration_sec: 4.0,
            emotion: "neutral".to_string(),
            image_prompt: format!("image for {}", id),
            speaker: speaker.to_string(),
        };
        ScriptData {
            title: "AI shorts".to_string(),
            full_script: "hook body cta".to_string(),
            scenes: vec![scene("hook", "alex"), scene("body_1", "mia"), scene("cta", "alex")],
            hook: "Did you know?".to_string(),
            cta: "Subscribe!".to_string(),
            estimated_duration_sec: 12.0,
        }
    }

    fn sample_media() -> MediaAssets {
        MediaAssets {
            audio_segments: vec![],
            images: vec![],
            video_clips: vec![],
            draft_hook_prompt: "A swirling galaxy of circuits".to_string(),
        }
    }

    fn sample_output() -> EditorOutput {
        EditorOutput {
            final_video_path: "/output/final.mp4".to_string(),
            caption_srt_path: "/output/captions.srt".to_string(),
            thumbnail_path: "/output/thumb.jpg".to_string(),
            metadata: VideoMetadata {
                title: "AI shorts".to_string(),
                description: "An AI short".to_string(),
                tags: vec!["ai".to_string()],
                category: "tech".to_string(),
            },
            duration_sec: 12.0,
        }
    }

    #[async_trait]
    impl StageWorker for ScriptedWorker {
        async fn execute(
            &self,
            stage: Stage,
            _inputs: &RunInputs,
            _state: &StageState,
        ) -> Result<StageOutput, WorkerError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_at == Some(stage) {
                return Err(WorkerError::Failed(format!("{} blew up", stage)));
            }
            Ok(match stage {
                Stage::TrendResearch => StageOutput::TrendResearch(sample_trend()),
                Stage::Scriptwriting => StageOutput::Scriptwriting(sample_script()),
                Stage::MediaProduction => StageOutput::MediaProduction(sample_media()),
                Stage::Editing => StageOutput::Editing(sample_output()),
            })
        }
    }

    pub(crate) fn engine_with(worker: ScriptedWorker) -> Arc<RunEngine> {
        RunEngine::new(
            Arc::new(MemoryRunStore::new()),
            Arc::new(worker),
            config::default_roster(),
        )
    }

    /// Poll the store until the run reaches `status`, or panic.
    pub(crate) async fn wait_for_status(engine: &Arc<RunEngine>, id: Uuid, status: RunStatus) {
        for _ in 0..200 {
            let run = engine.fetch_run(id).await.unwrap();
            if run.status == status {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let run = engine.fetch_run(id).await.unwrap();
        panic!(
            "run {} never reached {} (stuck at {})",
            id, status, run.status
        );
    }

    fn approve() -> ResumePayload {
        ResumePayload::Review {
            approved: true,
            feedback: None,
        }
    }

    fn pick_speakers() -> ResumePayload {
        ResumePayload::SpeakerSelection {
            host: "alex".to_string(),
            participants: vec!["mia".to_string()],
        }
    }

    fn pick_topic(topic: &str) -> ResumePayload {
        ResumePayload::TopicSelection {
            selected_topic: topic.to_string(),
        }
    }

    fn tts() -> ResumePayload {
        ResumePayload::AudioChoice {
            source: AudioSource::Tts,
            files: None,
        }
    }

    fn keep_prompt(prompt: &str) -> ResumePayload {
        ResumePayload::HookPrompt {
            prompt: prompt.to_string(),
        }
    }

    #[tokio::test]
    async fn test_round_trip_reaches_completed() {
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        let id = run.id;

        wait_for_status(&engine, id, RunStatus::WaitingForTopicSelection).await;
        engine.resume(id, Gate::TopicSelection, pick_topic("ai")).await.unwrap();

        wait_for_status(&engine, id, RunStatus::WaitingForSpeakerSelection).await;
        engine.resume(id, Gate::SpeakerSelection, pick_speakers()).await.unwrap();

        wait_for_status(&engine, id, RunStatus::WaitingForReview).await;
        engine.resume(id, Gate::Review, approve()).await.unwrap();

        wait_for_status(&engine, id, RunStatus::WaitingForAudioChoice).await;
        engine.resume(id, Gate::AudioChoice, tts()).await.unwrap();

        wait_for_status(&engine, id, RunStatus::WaitingForHookPrompt).await;
        engine
            .resume(id, Gate::HookPrompt, keep_prompt("A swirling galaxy of circuits"))
            .await
            .unwrap();

        wait_for_status(&engine, id, RunStatus::Completed).await;

        let result = engine.result(id).await.unwrap();
        assert_eq!(result.final_video_path, "/output/final.mp4");

        let run = engine.fetch_run(id).await.unwrap();
        assert!(run.pending_interrupt.is_none());
        assert_eq!(run.stage_state.selected_topic.as_deref(), Some("ai"));
        assert_eq!(run.stage_state.hook_prompt.as_deref(), Some("A swirling galaxy of circuits"));
    }

    #[tokio::test]
    async fn test_topic_gate_scenario() {
        // Concrete scenario: created run is running at trend_research, then
        // suspends with the researched topics; after the selection is
        // processed the status never reverts to the topic gate.
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.current_stage, Some(Stage::TrendResearch));

        wait_for_status(&engine, run.id, RunStatus::WaitingForTopicSelection).await;
        let interrupt = engine
            .fetch_interrupt(run.id, Gate::TopicSelection)
            .await
            .unwrap();
        match interrupt {
            shortcast_core::domain::gate::InterruptPayload::TopicSelection { topics } => {
                assert_eq!(topics.len(), 2);
            }
            other => panic!("unexpected interrupt: {:?}", other),
        }

        engine.resume(run.id, Gate::TopicSelection, pick_topic("space")).await.unwrap();
        wait_for_status(&engine, run.id, RunStatus::WaitingForSpeakerSelection).await;

        let current = engine.fetch_run(run.id).await.unwrap();
        assert_ne!(current.status, RunStatus::WaitingForTopicSelection);
    }

    #[tokio::test]
    async fn test_fetch_interrupt_only_at_matching_gate() {
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        wait_for_status(&engine, run.id, RunStatus::WaitingForTopicSelection).await;

        assert!(engine.fetch_interrupt(run.id, Gate::TopicSelection).await.is_ok());
        for gate in [
            Gate::SpeakerSelection,
            Gate::Review,
            Gate::AudioChoice,
            Gate::HookPrompt,
        ] {
            let err = engine.fetch_interrupt(run.id, gate).await.unwrap_err();
            assert!(
                matches!(err, RunError::OrderingViolation(_)),
                "gate {}: {:?}",
                gate,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_second_resume_is_ordering_violation() {
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        wait_for_status(&engine, run.id, RunStatus::WaitingForTopicSelection).await;

        engine.resume(run.id, Gate::TopicSelection, pick_topic("ai")).await.unwrap();
        wait_for_status(&engine, run.id, RunStatus::WaitingForSpeakerSelection).await;

        let err = engine
            .resume(run.id, Gate::TopicSelection, pick_topic("ai"))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::OrderingViolation(_)));
    }

    #[tokio::test]
    async fn test_invalid_payload_leaves_run_untouched() {
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        wait_for_status(&engine, run.id, RunStatus::WaitingForTopicSelection).await;
        let before = engine.fetch_run(run.id).await.unwrap();

        let err = engine
            .resume(run.id, Gate::TopicSelection, pick_topic("not-offered"))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Validation(_)));

        let after = engine.fetch_run(run.id).await.unwrap();
        assert_eq!(after, before);

        // a corrected submission then succeeds
        engine.resume(run.id, Gate::TopicSelection, pick_topic("ai")).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejection_loops_back_to_review() {
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        let id = run.id;

        wait_for_status(&engine, id, RunStatus::WaitingForTopicSelection).await;
        engine.resume(id, Gate::TopicSelection, pick_topic("ai")).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForSpeakerSelection).await;
        engine.resume(id, Gate::SpeakerSelection, pick_speakers()).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForReview).await;

        engine
            .resume(
                id,
                Gate::Review,
                ResumePayload::Review {
                    approved: false,
                    feedback: Some("punchier hook".to_string()),
                },
            )
            .await
            .unwrap();

        // re-enters review, not audio choice
        wait_for_status(&engine, id, RunStatus::WaitingForReview).await;
        let run = engine.fetch_run(id).await.unwrap();
        assert_eq!(run.current_stage, Some(Stage::Scriptwriting));
        assert_eq!(run.stage_state.review_feedback, vec!["punchier hook"]);

        engine.resume(id, Gate::Review, approve()).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForAudioChoice).await;
    }

    #[tokio::test]
    async fn test_resume_while_executor_in_flight_is_busy() {
        let engine = engine_with(ScriptedWorker {
            fail_at: None,
            delay: Duration::from_millis(300),
        });
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        let id = run.id;

        wait_for_status(&engine, id, RunStatus::WaitingForTopicSelection).await;
        engine.resume(id, Gate::TopicSelection, pick_topic("ai")).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForSpeakerSelection).await;

        // speaker resume spawns the slow scriptwriting stage
        engine.resume(id, Gate::SpeakerSelection, pick_speakers()).await.unwrap();

        // while the stage worker is in flight, a second resume is rejected
        let err = engine
            .resume(id, Gate::SpeakerSelection, pick_speakers())
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::RunBusy(_)));

        wait_for_status(&engine, id, RunStatus::WaitingForReview).await;
    }

    #[tokio::test]
    async fn test_worker_failure_terminates_run() {
        let engine = engine_with(ScriptedWorker {
            fail_at: Some(Stage::Scriptwriting),
            delay: Duration::ZERO,
        });
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        let id = run.id;

        wait_for_status(&engine, id, RunStatus::WaitingForTopicSelection).await;
        engine.resume(id, Gate::TopicSelection, pick_topic("ai")).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForSpeakerSelection).await;
        engine.resume(id, Gate::SpeakerSelection, pick_speakers()).await.unwrap();

        wait_for_status(&engine, id, RunStatus::Failed).await;
        let run = engine.fetch_run(id).await.unwrap();
        assert!(run.error.as_deref().unwrap().contains("scriptwriting"));
        assert!(run.pending_interrupt.is_none());

        // terminal states are absorbing
        let err = engine.resume(id, Gate::Review, approve()).await.unwrap_err();
        assert!(matches!(err, RunError::OrderingViolation(_)));
        let err = engine.result(id).await.unwrap_err();
        assert!(matches!(err, RunError::NotCompleted(_)));
    }

    #[tokio::test]
    async fn test_manual_audio_files_recorded() {
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        let id = run.id;

        wait_for_status(&engine, id, RunStatus::WaitingForTopicSelection).await;
        engine.resume(id, Gate::TopicSelection, pick_topic("ai")).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForSpeakerSelection).await;
        engine.resume(id, Gate::SpeakerSelection, pick_speakers()).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForReview).await;
        engine.resume(id, Gate::Review, approve()).await.unwrap();
        wait_for_status(&engine, id, RunStatus::WaitingForAudioChoice).await;

        let interrupt = engine.fetch_interrupt(id, Gate::AudioChoice).await.unwrap();
        let scenes: Vec<SceneRef> = match interrupt {
            shortcast_core::domain::gate::InterruptPayload::AudioChoice { scenes } => scenes,
            other => panic!("unexpected interrupt: {:?}", other),
        };
        let files: HashMap<String, String> = scenes
            .iter()
            .map(|s| (s.scene_id.clone(), format!("/uploads/{}.mp3", s.scene_id)))
            .collect();

        engine
            .resume(
                id,
                Gate::AudioChoice,
                ResumePayload::AudioChoice {
                    source: AudioSource::Manual,
                    files: Some(files.clone()),
                },
            )
            .await
            .unwrap();

        wait_for_status(&engine, id, RunStatus::WaitingForHookPrompt).await;
        let run = engine.fetch_run(id).await.unwrap();
        let audio = run.stage_state.audio.unwrap();
        assert_eq!(audio.source, AudioSource::Manual);
        assert_eq!(audio.files.unwrap(), files);
    }

    #[tokio::test]
    async fn test_result_before_completion_rejected() {
        let engine = engine_with(ScriptedWorker::instant());
        let run = engine.start_run(RunInputs::default()).await.unwrap();
        wait_for_status(&engine, run.id, RunStatus::WaitingForTopicSelection).await;

        let err = engine.result(run.id).await.unwrap_err();
        assert!(matches!(err, RunError::NotCompleted(_)));
    }

    #[tokio::test]
    async fn test_unknown_run_is_not_found() {
        let engine = engine_with(ScriptedWorker::instant());
        let err = engine.status(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, RunError::NotFound(_)));
    }

    /// Memory store whose first `update` fails, simulating a transient
    /// database outage mid-advance.
    struct FlakyStore {
        inner: MemoryRunStore,
        fail_next_update: std::sync::atomic::AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: MemoryRunStore::new(),
                fail_next_update: std::sync::atomic::AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl RunStore for FlakyStore {
        async fn insert(&self, run: &PipelineRun) -> Result<(), crate::store::StoreError> {
            self.inner.insert(run).await
        }

        async fn fetch(&self, id: Uuid) -> Result<Option<PipelineRun>, crate::store::StoreError> {
            self.inner.fetch(id).await
        }

        async fn update(&self, run: &PipelineRun) -> Result<(), crate::store::StoreError> {
            if self
                .fail_next_update
                .swap(false, std::sync::atomic::Ordering::SeqCst)
            {
                return Err(crate::store::StoreError::Database(
                    sqlx::Error::PoolTimedOut,
                ));
            }
            self.inner.update(run).await
        }
    }

    #[tokio::test]
    async fn test_store_outage_mid_advance_records_failure() {
        // The first update (persisting the stage position) fails; the
        // executor must not strand the run in Running with no executor.
        let engine = RunEngine::new(
            Arc::new(FlakyStore::new()),
            Arc::new(ScriptedWorker::instant()),
            config::default_roster(),
        );
        let run = engine.start_run(RunInputs::default()).await.unwrap();

        wait_for_status(&engine, run.id, RunStatus::Failed).await;
        let run = engine.fetch_run(run.id).await.unwrap();
        assert!(run.error.as_deref().unwrap().contains("executor aborted"));
        assert!(run.pending_interrupt.is_none());
    }
}
