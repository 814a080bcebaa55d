//! Focus session output types and assembly.
//!
//! The assembler is the last stage: it merges dependency annotations,
//! switch costs, and ranking results into response entries, truncates to
//! the requested count, and never reorders.

use serde::Serialize;

use crate::engine::ranking::Complexity;
use crate::engine::ScoredCandidate;
use crate::graph::ChainContext;
use crate::model::{EnergyLevel, WorkMode};

/// Headline numbers for one focus session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Eligible candidates after filtering (before truncation).
    pub total_candidates: usize,
    /// Tasks excluded because of unresolved dependencies.
    pub blocked_excluded: usize,
    pub energy: EnergyLevel,
    pub mode: WorkMode,
    /// Which backend produced the order ("gemini", "heuristic", ...).
    pub strategy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// True when the ranking service failed and the heuristic order was
    /// used instead.
    pub fallback: bool,
}

/// One recommended task with its annotations.
#[derive(Debug, Clone, Serialize)]
pub struct FocusEntry {
    pub task_id: i64,
    pub title: String,
    pub project_id: i64,
    /// Final position, 1-based.
    pub rank: usize,
    pub heuristic_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<Complexity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub is_blocked: bool,
    pub blocked_by_ids: Vec<i64>,
    pub blocking_ids: Vec<i64>,
    pub unlocks_tasks: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_context: Option<ChainContext>,
    pub switch_cost: f64,
}

/// The ordered, annotated recommendation list for one invocation.
/// Recomputed every call; nothing here persists.
#[derive(Debug, Clone, Serialize)]
pub struct FocusSession {
    pub summary: SessionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub entries: Vec<FocusEntry>,
}

/// Turn the final candidate order into response entries.
pub(crate) fn assemble(
    candidates: Vec<ScoredCandidate>,
    summary: SessionSummary,
    reasoning: Option<String>,
    max_tasks: usize,
) -> FocusSession {
    let entries = candidates
        .into_iter()
        .take(max_tasks)
        .enumerate()
        .map(|(i, c)| {
            let (ai_score, complexity, suggested_minutes, entry_reasoning) = match c.ranked {
                Some(r) => (Some(r.score), r.complexity, r.suggested_minutes, r.reasoning),
                None => (None, None, None, None),
            };
            FocusEntry {
                task_id: c.task.id,
                title: c.task.title,
                project_id: c.task.project_id,
                rank: i + 1,
                heuristic_score: c.heuristic_score,
                ai_score,
                complexity,
                suggested_minutes,
                reasoning: entry_reasoning,
                is_blocked: c.annotation.is_blocked,
                blocked_by_ids: c.annotation.blocked_by_ids,
                blocking_ids: c.annotation.blocking_ids,
                unlocks_tasks: c.annotation.unlocks_tasks,
                chain_context: c.annotation.chain,
                switch_cost: c.switch_cost,
            }
        })
        .collect();

    FocusSession {
        summary,
        reasoning,
        entries,
    }
}
