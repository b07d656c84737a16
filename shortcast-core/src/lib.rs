//! Shortcast Core
//!
//! Core types and abstractions for the Shortcast pipeline engine.
//!
//! This crate contains:
//! - Domain types: Core business entities (PipelineRun, StageState, gate payloads)
//! - Stage graph: The fixed stage/gate ordering and its routing rules
//! - DTOs: Data transfer objects for the orchestrator HTTP API

pub mod domain;
pub mod dto;
pub mod graph;
