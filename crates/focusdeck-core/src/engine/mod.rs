//! Focus recommendation engine.
//!
//! One `build_session` call processes one snapshot of tasks: validate
//! the options, annotate the dependency graph, filter and score
//! candidates, make at most one ranking-service call, and assemble the
//! session. Everything derived is built fresh per invocation and
//! dropped afterwards; the injected [`ContextTable`] is the only shared
//! state and is read-only here.

pub mod ranking;
pub mod scoring;

use chrono::Utc;
use tracing::{debug, warn};

use crate::context::{switch_cost, ContextTable};
use crate::error::CoreError;
use crate::graph::{DependencyAnnotation, DependencyGraph};
use crate::model::{FocusOptions, Task};
use crate::session::{assemble, FocusSession, SessionSummary};

use ranking::{
    RankedEntry, RankingBackend, RankingCandidate, RankingContext, MAX_RANKING_CANDIDATES,
};

/// A task that survived filtering, with everything the assembler needs.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub task: Task,
    pub annotation: DependencyAnnotation,
    pub switch_cost: f64,
    pub heuristic_score: f64,
    pub ranked: Option<RankedEntry>,
}

/// The focus recommendation engine.
pub struct FocusEngine {
    contexts: ContextTable,
    ranker: Box<dyn RankingBackend>,
}

impl FocusEngine {
    pub fn new(contexts: ContextTable, ranker: Box<dyn RankingBackend>) -> Self {
        Self { contexts, ranker }
    }

    /// Engine with the deterministic no-op ranker.
    pub fn heuristic(contexts: ContextTable) -> Self {
        Self::new(contexts, Box::new(ranking::HeuristicRanker))
    }

    /// Build one focus session from a task snapshot.
    ///
    /// Fails only on invalid options; every downstream problem degrades
    /// to the heuristic order and still returns a usable session.
    pub async fn build_session(
        &self,
        tasks: &[Task],
        options: &FocusOptions,
    ) -> Result<FocusSession, CoreError> {
        options.validate()?;

        let now = Utc::now();
        let graph = DependencyGraph::build(tasks);
        let current_context = options
            .current_project_id
            .map(|id| self.contexts.context_or_default(id));

        let mut blocked_excluded = 0usize;
        let mut candidates: Vec<ScoredCandidate> = Vec::new();
        for task in tasks {
            if task.done {
                continue;
            }
            let annotation = graph
                .annotation(task.id)
                .expect("graph covers every snapshot task")
                .clone();
            if annotation.is_blocked {
                blocked_excluded += 1;
                continue;
            }
            if !options.project_allowed(task.project_id) {
                continue;
            }
            if task.energy > options.energy {
                continue;
            }
            if task.estimated_minutes > options.max_minutes {
                continue;
            }
            let context = self.contexts.context_or_default(task.project_id);
            if !options.mode.accepts(context.typical_mode) {
                continue;
            }

            let cost = switch_cost(current_context.as_ref(), &context);
            let score = scoring::heuristic_score(task, &annotation, cost, options.energy, now);
            candidates.push(ScoredCandidate {
                task: task.clone(),
                annotation,
                switch_cost: cost,
                heuristic_score: score,
                ranked: None,
            });
        }

        // Deterministic fallback order: score descending, id ascending.
        candidates.sort_by(|a, b| {
            b.heuristic_score
                .total_cmp(&a.heuristic_score)
                .then_with(|| a.task.id.cmp(&b.task.id))
        });
        let total_candidates = candidates.len();
        debug!(
            total_candidates,
            blocked_excluded, "candidate pool scored"
        );

        let (candidates, strategy, confidence, reasoning, fallback) =
            self.apply_ranking(candidates, options).await;

        let summary = SessionSummary {
            total_candidates,
            blocked_excluded,
            energy: options.energy,
            mode: options.mode,
            strategy,
            confidence,
            fallback,
        };
        Ok(assemble(candidates, summary, reasoning, options.max_tasks))
    }

    /// Make the single ranking call and merge its outcome: service-ranked
    /// candidates first in service order, everything else behind them in
    /// heuristic order. Failures keep the heuristic order and flag the
    /// session as degraded.
    async fn apply_ranking(
        &self,
        mut candidates: Vec<ScoredCandidate>,
        options: &FocusOptions,
    ) -> (
        Vec<ScoredCandidate>,
        &'static str,
        Option<f64>,
        Option<String>,
        bool,
    ) {
        if candidates.is_empty() {
            return (candidates, "heuristic", None, None, false);
        }

        let current_project = options
            .current_project_id
            .map(|id| self.contexts.context_or_default(id).name);
        let context = RankingContext {
            energy: options.energy,
            mode: options.mode,
            current_project,
            max_tasks: options.max_tasks,
        };
        let request: Vec<RankingCandidate> = candidates
            .iter()
            .take(MAX_RANKING_CANDIDATES)
            .map(|c| RankingCandidate {
                task_id: c.task.id,
                title: c.task.title.clone(),
                project: self.contexts.context_or_default(c.task.project_id).name,
                priority: c.task.priority,
                energy: c.task.energy,
                estimated_minutes: c.task.estimated_minutes,
                heuristic_score: c.heuristic_score,
                unlocks_count: c.annotation.blocking_ids.len(),
                switch_cost: c.switch_cost,
            })
            .collect();

        match self.ranker.rank(&request, &context).await {
            Ok(Some(outcome)) => {
                let mut ranked: Vec<ScoredCandidate> = Vec::with_capacity(candidates.len());
                for entry in outcome.entries {
                    if let Some(pos) =
                        candidates.iter().position(|c| c.task.id == entry.task_id)
                    {
                        let mut candidate = candidates.remove(pos);
                        candidate.ranked = Some(entry);
                        ranked.push(candidate);
                    }
                }
                // Unranked candidates keep their heuristic order.
                ranked.append(&mut candidates);
                (
                    ranked,
                    self.ranker.name(),
                    outcome.confidence,
                    outcome.reasoning,
                    false,
                )
            }
            Ok(None) => (candidates, "heuristic", None, None, false),
            Err(err) => {
                warn!(%err, "ranking service failed; using heuristic order");
                (candidates, "heuristic", None, None, true)
            }
        }
    }
}
