//! Task-store data model and engine invocation options.
//!
//! Tasks and projects are read-only snapshots from the task store; the
//! engine never mutates them. [`FocusOptions`] is the validated boundary
//! for one "build a focus session" invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Smallest/largest allowed `max_tasks` for a focus session.
pub const MIN_SESSION_TASKS: usize = 1;
pub const MAX_SESSION_TASKS: usize = 50;

/// Smallest/largest allowed `max_minutes` for a focus session.
pub const MIN_SESSION_MINUTES: u32 = 5;
pub const MAX_SESSION_MINUTES: u32 = 480;

const DEFAULT_SESSION_TASKS: usize = 10;
const DEFAULT_SESSION_MINUTES: u32 = 300;

fn default_estimate() -> u32 {
    25
}

/// User energy level, ordered `low < medium < high`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl EnergyLevel {
    /// Position on the ordered scale (0..=2).
    pub fn rank(self) -> u8 {
        match self {
            EnergyLevel::Low => 0,
            EnergyLevel::Medium => 1,
            EnergyLevel::High => 2,
        }
    }

    /// Distance between two levels on the ordered scale.
    pub fn distance(self, other: EnergyLevel) -> u8 {
        self.rank().abs_diff(other.rank())
    }
}

impl fmt::Display for EnergyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Medium => "medium",
            EnergyLevel::High => "high",
        };
        f.write_str(s)
    }
}

impl FromStr for EnergyLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(EnergyLevel::Low),
            "medium" => Ok(EnergyLevel::Medium),
            "high" => Ok(EnergyLevel::High),
            other => Err(ValidationError::InvalidValue {
                field: "energy".into(),
                message: format!("expected low|medium|high, got '{other}'"),
            }),
        }
    }
}

/// Work mode requested for a session. `admin` accepts candidates of every
/// mode; `deep` and `quick` keep only matching projects.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkMode {
    #[default]
    Deep,
    Quick,
    Admin,
}

impl WorkMode {
    /// Whether a session in this mode accepts a candidate of `other` mode.
    pub fn accepts(self, other: WorkMode) -> bool {
        self == WorkMode::Admin || self == other
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkMode::Deep => "deep",
            WorkMode::Quick => "quick",
            WorkMode::Admin => "admin",
        };
        f.write_str(s)
    }
}

impl FromStr for WorkMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deep" => Ok(WorkMode::Deep),
            "quick" => Ok(WorkMode::Quick),
            "admin" => Ok(WorkMode::Admin),
            other => Err(ValidationError::InvalidValue {
                field: "mode".into(),
                message: format!("expected deep|quick|admin, got '{other}'"),
            }),
        }
    }
}

/// Broad category of the work a project involves.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum WorkType {
    Coding,
    Admin,
    Research,
    Writing,
    /// Catch-all, also used when a configured value is unrecognized.
    #[default]
    #[serde(other)]
    General,
}

/// Kind of a raw task relation. Anything other than the two blocking
/// kinds contributes no dependency edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Blocks,
    BlockedBy,
    #[serde(other)]
    Other,
}

/// Raw typed edge from a task to another task id, as reported by the
/// task store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub task_id: i64,
    pub kind: RelationKind,
}

/// One task from the store. Read-only input for a single invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    /// Ordinal priority, higher is more urgent (store convention 0..=5).
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub project_id: i64,
    /// Energy the task demands from whoever picks it up.
    #[serde(default)]
    pub energy: EnergyLevel,
    #[serde(default = "default_estimate")]
    pub estimated_minutes: u32,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

/// One project row from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent_project_id: Option<i64>,
}

/// Task comment from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub comment: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub created: String,
}

/// Parameters for one focus-session invocation.
///
/// `validate()` is the hard-failure boundary: everything past it either
/// succeeds or degrades, it never rejects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusOptions {
    pub energy: EnergyLevel,
    pub mode: WorkMode,
    #[serde(default)]
    pub current_project_id: Option<i64>,
    pub max_tasks: usize,
    /// Session time budget; candidates with a longer estimate are excluded.
    pub max_minutes: u32,
    #[serde(default)]
    pub only_projects: Vec<i64>,
    #[serde(default)]
    pub exclude_projects: Vec<i64>,
}

impl Default for FocusOptions {
    fn default() -> Self {
        Self {
            energy: EnergyLevel::Medium,
            mode: WorkMode::Deep,
            current_project_id: None,
            max_tasks: DEFAULT_SESSION_TASKS,
            max_minutes: DEFAULT_SESSION_MINUTES,
            only_projects: Vec::new(),
            exclude_projects: Vec::new(),
        }
    }
}

impl FocusOptions {
    /// Reject out-of-range parameters before any graph or scoring work.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_tasks < MIN_SESSION_TASKS || self.max_tasks > MAX_SESSION_TASKS {
            return Err(ValidationError::OutOfRange {
                field: "max_tasks".into(),
                value: self.max_tasks as i64,
                min: MIN_SESSION_TASKS as i64,
                max: MAX_SESSION_TASKS as i64,
            });
        }
        if self.max_minutes < MIN_SESSION_MINUTES || self.max_minutes > MAX_SESSION_MINUTES {
            return Err(ValidationError::OutOfRange {
                field: "max_minutes".into(),
                value: i64::from(self.max_minutes),
                min: i64::from(MIN_SESSION_MINUTES),
                max: i64::from(MAX_SESSION_MINUTES),
            });
        }
        Ok(())
    }

    /// Whether a task's project passes the include/exclude lists.
    pub fn project_allowed(&self, project_id: i64) -> bool {
        if !self.only_projects.is_empty() && !self.only_projects.contains(&project_id) {
            return false;
        }
        !self.exclude_projects.contains(&project_id)
    }
}
