//! # Focusdeck Core Library
//!
//! This library provides the core business logic for Focusdeck, a daily
//! focus recommender over a Vikunja-style task backlog. It follows a
//! CLI-first philosophy: all operations are available via a standalone
//! CLI binary built as a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Dependency Graph**: per-invocation blocking graph over task
//!   relations, with cycle handling and chain progress
//! - **Context Model**: per-project metadata and the context-switch
//!   cost function
//! - **Focus Engine**: candidate filtering, heuristic scoring, optional
//!   AI re-ranking with deterministic fallback, session assembly
//! - **Task Store**: async HTTP client for the task backlog
//!
//! ## Key Components
//!
//! - [`FocusEngine`]: one `build_session` call per snapshot
//! - [`DependencyGraph`]: blocking/unblocking analysis
//! - [`ContextTable`]: immutable per-process project contexts
//! - [`TaskStore`]: store API client

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod model;
pub mod session;
pub mod store;

pub use config::Settings;
pub use context::{switch_cost, ContextSource, ContextTable, ProjectContext};
pub use engine::ranking::{
    backend_from_settings, Complexity, GeminiRanker, HeuristicRanker, RankingBackend,
};
pub use engine::FocusEngine;
pub use graph::{ChainContext, DependencyAnnotation, DependencyGraph};
pub use model::{
    Comment, EnergyLevel, FocusOptions, Project, Relation, RelationKind, Task, WorkMode, WorkType,
};
pub use session::{FocusEntry, FocusSession, SessionSummary};
pub use store::{NewTask, TaskPatch, TaskStore};
pub use error::{ConfigError, CoreError, RankingError, StoreError, ValidationError};
