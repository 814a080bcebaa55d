//! Project context table and context-switch cost model.
//!
//! Every project gets a [`ProjectContext`] describing how cognitively
//! expensive it is to re-enter: configured explicitly in a JSON file,
//! embedded as a marker block in the project description, or synthesized
//! from defaults. [`switch_cost`] turns two contexts into a numeric
//! penalty used by the candidate scorer.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::model::{EnergyLevel, Project, WorkMode, WorkType};

/// Marker pair delimiting embedded context metadata inside a project
/// description.
pub const PROJECT_CONTEXT_BEGIN: &str = "<!-- PROJECT_CONTEXT:";
pub const PROJECT_CONTEXT_END: &str = ":END_CONTEXT -->";

/// Mid-range default for `context_weight` (scale 0..=10).
pub const DEFAULT_CONTEXT_WEIGHT: u8 = 5;
const MAX_CONTEXT_WEIGHT: u8 = 10;

/// Fixed penalty when the candidate project's domain differs from the
/// current one, waived for related projects.
const DOMAIN_MISMATCH_PENALTY: f64 = 0.3;

/// Smaller fixed penalty when the work type differs.
const WORK_TYPE_MISMATCH_PENALTY: f64 = 0.15;

/// Per-tool penalty for each required tool the current project does not
/// already have open.
const TOOL_MISMATCH_PENALTY: f64 = 0.05;

/// Where a project's context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    /// Explicit entry in the JSON configuration file.
    Config,
    /// Parsed from a `PROJECT_CONTEXT` marker in the project description.
    Embedded,
    /// Synthesized defaults.
    #[default]
    Synthesized,
}

/// Per-project metadata driving the switch cost model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectContext {
    pub project_id: i64,
    pub name: String,
    pub work_type: WorkType,
    pub domain: String,
    pub typical_energy: EnergyLevel,
    pub typical_mode: WorkMode,
    /// How expensive the project is to re-enter, 0..=10.
    pub context_weight: u8,
    pub requires_tools: BTreeSet<String>,
    pub related_projects: BTreeSet<i64>,
    #[serde(skip_serializing_if = "is_synthesized")]
    pub source: ContextSource,
}

fn is_synthesized(source: &ContextSource) -> bool {
    *source == ContextSource::Synthesized
}

impl ProjectContext {
    /// Defaults for a project nothing is known about.
    pub fn synthesized(project_id: i64) -> Self {
        Self {
            project_id,
            name: format!("Project {project_id}"),
            work_type: WorkType::General,
            domain: project_id.to_string(),
            typical_energy: EnergyLevel::Medium,
            typical_mode: WorkMode::Deep,
            context_weight: DEFAULT_CONTEXT_WEIGHT,
            requires_tools: BTreeSet::new(),
            related_projects: BTreeSet::new(),
            source: ContextSource::Synthesized,
        }
    }
}

/// One entry as it appears in the config file or an embedded marker.
/// Every field is optional; missing values fall back to synthesized
/// defaults for the project.
#[derive(Debug, Clone, Default, Deserialize)]
struct ContextSpec {
    project_id: Option<i64>,
    name: Option<String>,
    #[serde(default)]
    work_type: Option<WorkType>,
    domain: Option<String>,
    #[serde(default)]
    typical_energy: Option<EnergyLevel>,
    #[serde(default)]
    typical_mode: Option<WorkMode>,
    context_weight: Option<u8>,
    #[serde(default)]
    requires_tools: Vec<String>,
    #[serde(default)]
    related_projects: Vec<i64>,
}

impl ContextSpec {
    fn into_context(self, project_id: i64, source: ContextSource) -> ProjectContext {
        let defaults = ProjectContext::synthesized(project_id);
        ProjectContext {
            project_id,
            name: self.name.unwrap_or(defaults.name),
            work_type: self.work_type.unwrap_or(defaults.work_type),
            domain: self.domain.unwrap_or(defaults.domain),
            typical_energy: self.typical_energy.unwrap_or(defaults.typical_energy),
            typical_mode: self.typical_mode.unwrap_or(defaults.typical_mode),
            context_weight: self
                .context_weight
                .unwrap_or(defaults.context_weight)
                .min(MAX_CONTEXT_WEIGHT),
            requires_tools: self.requires_tools.into_iter().collect(),
            related_projects: self.related_projects.into_iter().collect(),
            source,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ContextFile {
    #[serde(default)]
    projects: Vec<ContextSpec>,
}

/// Immutable per-process table of project contexts.
///
/// Loaded once before a request and passed into the engine by value;
/// the engine never mutates it (see the concurrency notes in the crate
/// docs). Precedence: config file > embedded marker > synthesized.
#[derive(Debug, Clone, Default)]
pub struct ContextTable {
    contexts: HashMap<i64, ProjectContext>,
}

impl ContextTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table directly from contexts (programmatic configuration).
    pub fn from_contexts(contexts: impl IntoIterator<Item = ProjectContext>) -> Self {
        Self {
            contexts: contexts.into_iter().map(|c| (c.project_id, c)).collect(),
        }
    }

    /// Load the table from an optional config file and the project rows.
    ///
    /// A missing or unreadable config file degrades to embedded/default
    /// contexts with a warning; it is never fatal.
    pub fn load(config_path: Option<&Path>, projects: &[Project]) -> Self {
        let mut table = Self::new();

        for project in projects {
            if let Some(ctx) = parse_embedded_context(project) {
                table.contexts.insert(project.id, ctx);
            }
        }

        if let Some(path) = config_path {
            match Self::from_file(path) {
                Ok(file_table) => {
                    // Explicit config wins over embedded metadata.
                    table.contexts.extend(file_table.contexts);
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "project context config unusable; falling back");
                }
            }
        }

        debug!(loaded = table.contexts.len(), "project context table ready");
        table
    }

    /// Parse a `{"projects": [...]}` JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let file: ContextFile =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;

        let mut contexts = HashMap::new();
        for spec in file.projects {
            let Some(project_id) = spec.project_id else {
                warn!("skipping project context entry without project_id");
                continue;
            };
            contexts.insert(project_id, spec.into_context(project_id, ContextSource::Config));
        }
        Ok(Self { contexts })
    }

    /// Effective context for a project, synthesizing defaults when the
    /// project is unknown.
    pub fn context_or_default(&self, project_id: i64) -> ProjectContext {
        self.contexts
            .get(&project_id)
            .cloned()
            .unwrap_or_else(|| ProjectContext::synthesized(project_id))
    }

    /// Effective contexts for a set of project rows, in input order.
    pub fn enrich<'a>(&self, projects: impl IntoIterator<Item = &'a Project>) -> Vec<ProjectContext> {
        projects
            .into_iter()
            .map(|p| {
                let mut ctx = self.context_or_default(p.id);
                if ctx.source == ContextSource::Synthesized {
                    ctx.name = p.title.clone();
                }
                ctx
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Parse an embedded `PROJECT_CONTEXT` marker block from a project
/// description. Returns `None` when absent or unparseable.
pub fn parse_embedded_context(project: &Project) -> Option<ProjectContext> {
    let desc = &project.description;
    let start = desc.find(PROJECT_CONTEXT_BEGIN)? + PROJECT_CONTEXT_BEGIN.len();
    let len = desc[start..].find(PROJECT_CONTEXT_END)?;
    let body = desc[start..start + len].trim();

    match serde_json::from_str::<ContextSpec>(body) {
        Ok(spec) => {
            let named = spec.name.is_some();
            let mut ctx = spec.into_context(project.id, ContextSource::Embedded);
            if !named {
                ctx.name = project.title.clone();
            }
            Some(ctx)
        }
        Err(err) => {
            warn!(project = project.id, %err, "unparseable embedded project context");
            None
        }
    }
}

/// Cognitive cost of switching from the current project to a candidate.
///
/// Zero when there is no current project or the candidate is in it.
/// Otherwise the candidate's `context_weight` (scaled to [0, 1]) plus
/// fixed penalties for domain and work-type mismatch and a per-tool
/// penalty for required tools the current project does not share.
/// Relatedness (either direction) waives the domain penalty. Pure and
/// deterministic; always >= 0.
pub fn switch_cost(current: Option<&ProjectContext>, candidate: &ProjectContext) -> f64 {
    let Some(current) = current else {
        return 0.0;
    };
    if current.project_id == candidate.project_id {
        return 0.0;
    }

    let mut cost =
        f64::from(candidate.context_weight.min(MAX_CONTEXT_WEIGHT)) / f64::from(MAX_CONTEXT_WEIGHT);

    let related = current.related_projects.contains(&candidate.project_id)
        || candidate.related_projects.contains(&current.project_id);
    if !related && current.domain != candidate.domain {
        cost += DOMAIN_MISMATCH_PENALTY;
    }

    if current.work_type != candidate.work_type {
        cost += WORK_TYPE_MISMATCH_PENALTY;
    }

    let unshared = candidate
        .requires_tools
        .difference(&current.requires_tools)
        .count();
    cost += unshared as f64 * TOOL_MISMATCH_PENALTY;

    cost
}
