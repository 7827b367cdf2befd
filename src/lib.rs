//! Multi-Agent Orchestrator
//!
//! Coordination engine for a desk of specialized agents (research, analysis,
//! compliance, synthesis, planning):
//! - Turns user requests into phased conversations via two sequential LLM calls
//! - Delegates tasks to capacity-bounded agents with simulated async completion
//! - Routes inter-agent messages through a FIFO queue
//! - Selects and health-checks the AI model behind each task, with fallback
//!
//! PIPELINE:
//! UNDERSTANDING → PLANNING → EXECUTING → SYNTHESIZING → COMPLETED

pub mod api;
pub mod audit;
pub mod delegation;
pub mod error;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod queue;
pub mod registry;
pub mod roles;
pub mod selection;
pub mod tracking;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use orchestrator::Orchestrator;
