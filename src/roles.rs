//! Agent role resolution
//!
//! Maps planned task names (free-form strings produced by the planning call)
//! onto the closed set of agent roles, plus complexity derivation from the
//! same wording. Keyword scoring over static tables.

use crate::models::{AgentType, TaskComplexity, TaskType};

/// Static keyword lists — zero allocation
const RESEARCH_KEYWORDS: &[&str] = &[
    "research", "gather", "collect", "retrieve", "fetch", "scan", "source",
    "market data", "news", "web", "lookup", "discover",
];

const ANALYSIS_KEYWORDS: &[&str] = &[
    "analy", "evaluat", "assess", "model", "compute", "calculat", "valuation",
    "backtest", "benchmark", "quantif", "risk", "metric",
];

const COMPLIANCE_KEYWORDS: &[&str] = &[
    "complian", "regulat", "policy", "legal", "audit", "esg", "restriction",
    "rule check", "disclosure",
];

const SYNTHESIS_KEYWORDS: &[&str] = &[
    "synthes", "report", "summar", "compile", "draft", "write", "present",
    "format", "deliverable",
];

const PLANNING_KEYWORDS: &[&str] = &[
    "plan", "schedule", "roadmap", "sequence", "prioriti", "scope", "strategy",
    "breakdown",
];

const COMPLEX_MARKERS: &[&str] = &[
    "comprehensive", "deep", "detailed", "thorough", "full", "in-depth",
    "cross-reference", "end-to-end",
];

const SIMPLE_MARKERS: &[&str] = &["quick", "brief", "basic", "simple", "initial", "shallow"];

fn score(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| text.contains(**kw)).count()
}

/// Resolve the agent role for a planned task. The phase name participates in
/// scoring too since plans often carry the intent there ("Research Phase").
/// Falls back to `Research` when nothing matches — the generalist role.
pub fn resolve_agent_role(task_name: &str, phase_name: &str) -> AgentType {
    let text = format!("{} {}", task_name, phase_name).to_lowercase();

    let candidates = [
        (AgentType::Research, score(&text, RESEARCH_KEYWORDS)),
        (AgentType::Analysis, score(&text, ANALYSIS_KEYWORDS)),
        (AgentType::Compliance, score(&text, COMPLIANCE_KEYWORDS)),
        (AgentType::Synthesis, score(&text, SYNTHESIS_KEYWORDS)),
        (AgentType::Planning, score(&text, PLANNING_KEYWORDS)),
    ];

    let (best, best_score) = candidates
        .iter()
        .copied()
        .max_by_key(|(_, s)| *s)
        .unwrap_or((AgentType::Research, 0));

    if best_score == 0 {
        AgentType::Research
    } else {
        best
    }
}

/// Derive complexity from the task wording; `Medium` when nothing signals
/// otherwise.
pub fn derive_complexity(task_name: &str) -> TaskComplexity {
    let lowered = task_name.to_lowercase();
    if COMPLEX_MARKERS.iter().any(|kw| lowered.contains(kw)) {
        TaskComplexity::Complex
    } else if SIMPLE_MARKERS.iter().any(|kw| lowered.contains(kw)) {
        TaskComplexity::Simple
    } else {
        TaskComplexity::Medium
    }
}

/// Canonical task type for each role.
pub fn task_type_for_role(role: AgentType) -> TaskType {
    match role {
        AgentType::Research => TaskType::MarketResearch,
        AgentType::Analysis => TaskType::DataAnalysis,
        AgentType::Compliance => TaskType::ComplianceReview,
        AgentType::Synthesis => TaskType::ReportSynthesis,
        AgentType::Planning => TaskType::Planning,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_research_tasks() {
        let cases = vec![
            ("gather market data for tech sector", "Discovery"),
            ("retrieve recent earnings news", "Research Phase"),
            ("collect analyst coverage", ""),
        ];

        for (name, phase) in cases {
            assert_eq!(resolve_agent_role(name, phase), AgentType::Research);
        }
    }

    #[test]
    fn test_analysis_and_compliance_tasks() {
        assert_eq!(
            resolve_agent_role("evaluate portfolio risk metrics", "Analysis"),
            AgentType::Analysis
        );
        assert_eq!(
            resolve_agent_role("run regulatory disclosure audit", "Compliance Phase"),
            AgentType::Compliance
        );
    }

    #[test]
    fn test_synthesis_and_planning_tasks() {
        assert_eq!(
            resolve_agent_role("draft final report summary", "Deliverables"),
            AgentType::Synthesis
        );
        assert_eq!(
            resolve_agent_role("prioritize work breakdown", "Planning"),
            AgentType::Planning
        );
    }

    #[test]
    fn test_unmatched_falls_back_to_research() {
        assert_eq!(resolve_agent_role("xyzzy", ""), AgentType::Research);
    }

    #[test]
    fn test_complexity_markers() {
        assert_eq!(
            derive_complexity("comprehensive sector deep dive"),
            TaskComplexity::Complex
        );
        assert_eq!(derive_complexity("quick price check"), TaskComplexity::Simple);
        assert_eq!(derive_complexity("evaluate holdings"), TaskComplexity::Medium);
    }
}
