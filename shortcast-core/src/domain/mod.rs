//! Core domain types
//!
//! This module contains the domain structures used across Shortcast services.
//! These types represent the fundamental business entities and are shared between
//! the orchestrator (for persistence and execution) and the client (for rendering
//! wizard steps).

pub mod gate;
pub mod run;
pub mod stage;
pub mod state;
