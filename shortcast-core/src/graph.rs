//! Stage graph
//!
//! The fixed ordering of stages and gates, plus the routing decisions taken
//! after each of them. Routing is pure; the executor owns the actual
//! progression.
//!
//! ```text
//! trend_research -> [topic_selection] -> [speaker_selection] -> scriptwriting
//!   -> [review] -> [audio_choice] -> media_production -> [hook_prompt]
//!   -> editing -> done
//! ```
//!
//! The review gate's rejection branch routes back to scriptwriting; that is
//! the only cycle in the graph and it is bounded by the human who must
//! resubmit each iteration.

use crate::domain::gate::ResumePayload;
use crate::domain::stage::{Gate, Stage};

/// One position in the graph, as seen by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stage(Stage),
    Gate(Gate),
    Done,
}

/// Routing decision a gate's resume payload produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Advance,
    /// Review rejection: route back to scriptwriting.
    Revise,
}

impl ResumePayload {
    pub fn outcome(&self) -> GateOutcome {
        match self {
            ResumePayload::Review { approved: false, .. } => GateOutcome::Revise,
            _ => GateOutcome::Advance,
        }
    }
}

/// Entry point of every run.
pub fn entry() -> Step {
    Step::Stage(Stage::TrendResearch)
}

/// The step following a successfully completed stage.
pub fn after_stage(stage: Stage) -> Step {
    match stage {
        Stage::TrendResearch => Step::Gate(Gate::TopicSelection),
        Stage::Scriptwriting => Step::Gate(Gate::Review),
        Stage::MediaProduction => Step::Gate(Gate::HookPrompt),
        Stage::Editing => Step::Done,
    }
}

/// The step following a satisfied gate.
pub fn after_gate(gate: Gate, outcome: GateOutcome) -> Step {
    match (gate, outcome) {
        (Gate::Review, GateOutcome::Revise) => Step::Stage(Stage::Scriptwriting),
        (Gate::TopicSelection, _) => Step::Gate(Gate::SpeakerSelection),
        (Gate::SpeakerSelection, _) => Step::Stage(Stage::Scriptwriting),
        (Gate::Review, GateOutcome::Advance) => Step::Gate(Gate::AudioChoice),
        (Gate::AudioChoice, _) => Step::Stage(Stage::MediaProduction),
        (Gate::HookPrompt, _) => Step::Stage(Stage::Editing),
    }
}
