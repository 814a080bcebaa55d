//! Ranking backends for focus sessions.
//!
//! One capability trait, two implementations: [`GeminiRanker`] makes a
//! single bounded call to the Gemini `generateContent` endpoint, and
//! [`HeuristicRanker`] deterministically declines so the heuristic order
//! stands. Which one runs is decided by configuration at construction
//! time, never by inspecting types at runtime.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::error::RankingError;
use crate::model::{EnergyLevel, WorkMode};

/// Cap on candidates sent to the ranking service per invocation.
pub const MAX_RANKING_CANDIDATES: usize = 30;

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Complexity estimate attached by the ranking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Low,
    Medium,
    High,
}

/// One candidate as presented to the ranking service.
#[derive(Debug, Clone, Serialize)]
pub struct RankingCandidate {
    pub task_id: i64,
    pub title: String,
    pub project: String,
    pub priority: i32,
    pub energy: EnergyLevel,
    pub estimated_minutes: u32,
    pub heuristic_score: f64,
    /// Number of tasks completing this one would unblock.
    pub unlocks_count: usize,
    pub switch_cost: f64,
}

/// Invocation context shared with the ranking service.
#[derive(Debug, Clone, Serialize)]
pub struct RankingContext {
    pub energy: EnergyLevel,
    pub mode: WorkMode,
    pub current_project: Option<String>,
    pub max_tasks: usize,
}

/// Per-task result from a successful ranking call.
#[derive(Debug, Clone, Deserialize)]
pub struct RankedEntry {
    pub task_id: i64,
    /// Service-assigned score in [0, 1].
    pub score: f64,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub suggested_minutes: Option<u32>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

/// A parsed, validated ranking response.
#[derive(Debug, Clone)]
pub struct RankingOutcome {
    /// Entries in the service's preferred order (score descending).
    pub entries: Vec<RankedEntry>,
    pub reasoning: Option<String>,
    pub confidence: Option<f64>,
}

/// A source of task rankings. `rank` is called at most once per focus
/// session; `Ok(None)` means the backend declines and the heuristic
/// order stands unchanged.
#[async_trait]
pub trait RankingBackend: Send + Sync {
    /// Strategy label surfaced in the session summary.
    fn name(&self) -> &'static str;

    async fn rank(
        &self,
        candidates: &[RankingCandidate],
        context: &RankingContext,
    ) -> Result<Option<RankingOutcome>, RankingError>;
}

/// Deterministic no-op backend used when no ranking service is
/// configured. Always declines.
pub struct HeuristicRanker;

#[async_trait]
impl RankingBackend for HeuristicRanker {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn rank(
        &self,
        _candidates: &[RankingCandidate],
        _context: &RankingContext,
    ) -> Result<Option<RankingOutcome>, RankingError> {
        Ok(None)
    }
}

/// Ranking adapter for the Gemini REST API.
///
/// Exactly one `generateContent` call per invocation, bounded by a
/// timeout; any failure is returned to the engine, which falls back to
/// the heuristic order. Retries belong to the transport, not here.
pub struct GeminiRanker {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl GeminiRanker {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: GEMINI_ENDPOINT.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }

    /// Point the ranker at a different endpoint (tests).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl RankingBackend for GeminiRanker {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn rank(
        &self,
        candidates: &[RankingCandidate],
        context: &RankingContext,
    ) -> Result<Option<RankingOutcome>, RankingError> {
        if candidates.is_empty() {
            return Ok(None);
        }

        let prompt = build_ranking_prompt(candidates, context);
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.endpoint, self.model, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let send = self.http.post(&url).json(&body).send();
        let response = tokio::time::timeout(self.timeout, send)
            .await
            .map_err(|_| RankingError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })??;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RankingError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RankingError::MalformedResponse(e.to_string()))?;
        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                RankingError::MalformedResponse("no text part in response".into())
            })?;

        let outcome = parse_ranking_reply(text, candidates)?;
        debug!(ranked = outcome.entries.len(), "ranking service replied");
        Ok(Some(outcome))
    }
}

/// Select a backend from configuration: an API key selects the remote
/// ranker, otherwise the deterministic no-op.
pub fn backend_from_settings(settings: &Settings) -> Box<dyn RankingBackend> {
    match settings.ranking.api_key.as_deref() {
        Some(key) if !key.is_empty() => Box::new(GeminiRanker::new(
            key,
            &settings.ranking.model,
            Duration::from_secs(settings.ranking.timeout_secs),
        )),
        _ => Box::new(HeuristicRanker),
    }
}

fn build_ranking_prompt(candidates: &[RankingCandidate], context: &RankingContext) -> String {
    let mut lines = Vec::with_capacity(candidates.len());
    for c in candidates {
        let mut line = format!(
            "- id {}: \"{}\" (project: {}, priority: {}, energy: {}, est: {} min, \
             heuristic: {:.1}, switch_cost: {:.2})",
            c.task_id,
            c.title,
            c.project,
            c.priority,
            c.energy,
            c.estimated_minutes,
            c.heuristic_score,
            c.switch_cost,
        );
        if c.unlocks_count > 0 {
            line.push_str(&format!(" [UNBLOCKS {} task(s)]", c.unlocks_count));
        }
        lines.push(line);
    }

    let current_project = context.current_project.as_deref().unwrap_or("none");
    format!(
        "You rank tasks for a focus session.\n\n\
         USER CONTEXT:\n\
         - Energy level: {}\n\
         - Work mode: {}\n\
         - Current project: {}\n\
         - Max tasks: {}\n\n\
         TASKS:\n{}\n\n\
         RANKING CRITERIA:\n\
         1. Match tasks to the user's energy level and work mode.\n\
         2. Respect task priority and the precomputed heuristic score.\n\
         3. Prefer tasks marked [UNBLOCKS ...]; completing them enables more work.\n\
         4. Penalize high switch_cost tasks unless they are clearly more important.\n\n\
         Return ONLY valid JSON, no markdown code blocks, shaped as:\n\
         {{\"ranked_tasks\": [{{\"task_id\": 1, \"score\": 0.95, \
         \"complexity\": \"low|medium|high\", \"suggested_minutes\": 25, \
         \"reasoning\": \"...\"}}], \
         \"overall_reasoning\": \"...\", \"confidence\": 0.8}}",
        context.energy,
        context.mode,
        current_project,
        context.max_tasks,
        lines.join("\n"),
    )
}

#[derive(Debug, Deserialize)]
struct RankingReply {
    #[serde(default)]
    ranked_tasks: Vec<RankedEntry>,
    #[serde(default)]
    overall_reasoning: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
}

/// Parse the model's reply into a validated outcome: fences stripped,
/// unknown task ids dropped, scores clamped to [0, 1], order by score
/// descending with ascending id as the tie-break.
fn parse_ranking_reply(
    text: &str,
    candidates: &[RankingCandidate],
) -> Result<RankingOutcome, RankingError> {
    let body = strip_code_fences(text);
    let reply: RankingReply = serde_json::from_str(body)
        .map_err(|e| RankingError::MalformedResponse(e.to_string()))?;

    let mut entries: Vec<RankedEntry> = reply
        .ranked_tasks
        .into_iter()
        .filter(|e| candidates.iter().any(|c| c.task_id == e.task_id))
        .map(|mut e| {
            e.score = e.score.clamp(0.0, 1.0);
            e
        })
        .collect();
    // Duplicate ids keep their first occurrence.
    let mut seen = std::collections::HashSet::new();
    entries.retain(|e| seen.insert(e.task_id));
    entries.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.task_id.cmp(&b.task_id))
    });

    Ok(RankingOutcome {
        entries,
        reasoning: reply.overall_reasoning,
        confidence: reply.confidence.map(|c| c.clamp(0.0, 1.0)),
    })
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line, then the trailing fence.
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
