//! Agent registry
//!
//! Static capability table per agent type plus live status (current task
//! ids). The capacity invariant `current_tasks.len() <= max_concurrent_tasks`
//! is enforced here: check-and-increment happens under a single write guard,
//! so concurrent delegation attempts cannot overshoot.

use crate::models::{
    AgentCapabilities, AgentStatus, AgentType, Availability, TaskType,
};
use lazy_static::lazy_static;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOp {
    Add,
    Remove,
}

/// Expected adjustment failures, returned as values per the error policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjustError {
    UnknownAgent(AgentType),
    AtCapacity(AgentType),
    Offline(AgentType),
}

impl fmt::Display for AdjustError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustError::UnknownAgent(_) => write!(f, "unknown agent"),
            AdjustError::AtCapacity(agent) => write!(f, "{} at capacity", agent),
            AdjustError::Offline(agent) => write!(f, "{} offline", agent),
        }
    }
}

struct AgentState {
    availability: Availability,
    current_tasks: BTreeSet<Uuid>,
    capabilities: AgentCapabilities,
}

impl AgentState {
    fn snapshot(&self, agent_type: AgentType) -> AgentStatus {
        AgentStatus {
            agent_type,
            availability: self.availability,
            current_tasks: self.current_tasks.clone(),
            capabilities: self.capabilities.clone(),
        }
    }

    fn refresh_availability(&mut self) {
        if self.availability == Availability::Offline {
            return;
        }
        self.availability = if self.current_tasks.is_empty() {
            Availability::Idle
        } else {
            Availability::Busy
        };
    }
}

/// Registry over all agent types known to this orchestrator instance.
pub struct AgentRegistry {
    agents: RwLock<HashMap<AgentType, AgentState>>,
}

impl AgentRegistry {
    /// Build a registry from an explicit capability table. Agent types absent
    /// from the table are unknown to this instance.
    pub fn new(table: HashMap<AgentType, AgentCapabilities>) -> Self {
        let agents = table
            .into_iter()
            .map(|(agent_type, capabilities)| {
                (
                    agent_type,
                    AgentState {
                        availability: Availability::Idle,
                        current_tasks: BTreeSet::new(),
                        capabilities,
                    },
                )
            })
            .collect();

        Self {
            agents: RwLock::new(agents),
        }
    }

    /// Registry with the built-in capability table for all five agent types.
    pub fn with_defaults() -> Self {
        Self::new(default_capability_table())
    }

    /// Snapshot of one agent, or `None` for an unregistered type.
    pub async fn get(&self, agent_type: AgentType) -> Option<AgentStatus> {
        let agents = self.agents.read().await;
        agents.get(&agent_type).map(|s| s.snapshot(agent_type))
    }

    /// Snapshot of every registered agent, ordered by type.
    pub async fn snapshot(&self) -> Vec<AgentStatus> {
        let agents = self.agents.read().await;
        let mut all: Vec<_> = agents
            .iter()
            .map(|(t, s)| s.snapshot(*t))
            .collect();
        all.sort_by_key(|s| s.agent_type);
        all
    }

    /// Atomically add or remove a task id for an agent. `Add` fails when the
    /// agent is at capacity or offline; `Remove` of an unknown id is a no-op.
    pub async fn adjust(
        &self,
        agent_type: AgentType,
        task_id: Uuid,
        op: AdjustOp,
    ) -> Result<(), AdjustError> {
        let mut agents = self.agents.write().await;
        let state = agents
            .get_mut(&agent_type)
            .ok_or(AdjustError::UnknownAgent(agent_type))?;

        match op {
            AdjustOp::Add => {
                if state.availability == Availability::Offline {
                    return Err(AdjustError::Offline(agent_type));
                }
                if state.current_tasks.len() >= state.capabilities.max_concurrent_tasks {
                    return Err(AdjustError::AtCapacity(agent_type));
                }
                state.current_tasks.insert(task_id);
            }
            AdjustOp::Remove => {
                state.current_tasks.remove(&task_id);
            }
        }

        state.refresh_availability();

        debug!(
            agent = %agent_type,
            load = state.current_tasks.len(),
            capacity = state.capabilities.max_concurrent_tasks,
            "Registry adjusted"
        );

        Ok(())
    }

    pub async fn set_offline(&self, agent_type: AgentType) -> bool {
        let mut agents = self.agents.write().await;
        match agents.get_mut(&agent_type) {
            Some(state) => {
                state.availability = Availability::Offline;
                true
            }
            None => false,
        }
    }

    pub async fn set_online(&self, agent_type: AgentType) -> bool {
        let mut agents = self.agents.write().await;
        match agents.get_mut(&agent_type) {
            Some(state) => {
                state.availability = Availability::Idle;
                state.refresh_availability();
                true
            }
            None => false,
        }
    }
}

lazy_static! {
    static ref CAPABILITY_TABLE: HashMap<AgentType, AgentCapabilities> = {
        let mut table = HashMap::new();
        table.insert(
            AgentType::Research,
            AgentCapabilities {
                supported_tasks: BTreeSet::from([TaskType::MarketResearch]),
                max_concurrent_tasks: 3,
                average_processing_time_ms: 12_000,
                reliability: 0.92,
                specializations: vec![
                    "market-data".to_string(),
                    "news-coverage".to_string(),
                    "sector-scans".to_string(),
                ],
            },
        );
        table.insert(
            AgentType::Analysis,
            AgentCapabilities {
                supported_tasks: BTreeSet::from([TaskType::DataAnalysis]),
                max_concurrent_tasks: 2,
                average_processing_time_ms: 20_000,
                reliability: 0.95,
                specializations: vec![
                    "quantitative-modeling".to_string(),
                    "risk-metrics".to_string(),
                ],
            },
        );
        table.insert(
            AgentType::Compliance,
            AgentCapabilities {
                supported_tasks: BTreeSet::from([TaskType::ComplianceReview]),
                max_concurrent_tasks: 2,
                average_processing_time_ms: 8_000,
                reliability: 0.99,
                specializations: vec!["regulatory-review".to_string()],
            },
        );
        table.insert(
            AgentType::Synthesis,
            AgentCapabilities {
                supported_tasks: BTreeSet::from([TaskType::ReportSynthesis]),
                max_concurrent_tasks: 1,
                average_processing_time_ms: 15_000,
                reliability: 0.97,
                specializations: vec!["report-writing".to_string()],
            },
        );
        table.insert(
            AgentType::Planning,
            AgentCapabilities {
                supported_tasks: BTreeSet::from([TaskType::Planning]),
                max_concurrent_tasks: 2,
                average_processing_time_ms: 10_000,
                reliability: 0.94,
                specializations: vec!["work-breakdown".to_string()],
            },
        );
        table
    };
}

/// Clone of the built-in capability table.
pub fn default_capability_table() -> HashMap<AgentType, AgentCapabilities> {
    CAPABILITY_TABLE.clone()
}
