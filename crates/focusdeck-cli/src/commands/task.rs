//! Task management commands.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use serde_json::json;

use focusdeck_core::{DependencyGraph, EnergyLevel, NewTask, TaskPatch};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Get full details for one task, including dependency annotations
    Get {
        /// Task id
        id: i64,
    },
    /// Create a new task or update an existing one
    Upsert {
        /// Task id to update (omit to create)
        #[arg(long)]
        id: Option<i64>,
        /// Project id (required for new tasks)
        #[arg(long)]
        project_id: Option<i64>,
        /// Task title
        #[arg(long)]
        title: Option<String>,
        /// Mark the task done or not done
        #[arg(long)]
        done: Option<bool>,
        /// Priority (0-5)
        #[arg(long)]
        priority: Option<i32>,
        /// Due date, RFC 3339 (e.g. 2025-06-02T17:00:00Z)
        #[arg(long)]
        due_date: Option<DateTime<Utc>>,
        /// Energy requirement: low, medium, high
        #[arg(long)]
        energy: Option<String>,
        /// Duration estimate in minutes
        #[arg(long)]
        estimated_minutes: Option<u32>,
    },
    /// Add a comment to a task
    Comment {
        /// Task id
        id: i64,
        /// Comment text
        comment: String,
    },
    /// Apply the same update to several tasks
    Bulk {
        /// Task ids (comma-separated)
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<i64>,
        /// Mark all tasks done or not done
        #[arg(long)]
        done: Option<bool>,
        /// Set priority for all tasks (0-5)
        #[arg(long)]
        priority: Option<i32>,
    },
}

pub async fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TaskAction::Get { id } => get(id).await,
        TaskAction::Upsert {
            id,
            project_id,
            title,
            done,
            priority,
            due_date,
            energy,
            estimated_minutes,
        } => {
            upsert(
                id,
                project_id,
                title,
                done,
                priority,
                due_date,
                energy,
                estimated_minutes,
            )
            .await
        }
        TaskAction::Comment { id, comment } => add_comment(id, &comment).await,
        TaskAction::Bulk {
            ids,
            done,
            priority,
        } => bulk(ids, done, priority).await,
    }
}

async fn get(id: i64) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = super::connect()?;

    let (task, all_tasks, comments) = tokio::try_join!(
        store.task(id),
        store.all_tasks(None),
        store.comments(id)
    )?;
    let project = store.project(task.project_id).await?;

    let graph = DependencyGraph::build(&all_tasks);
    let dependencies = graph.annotation(id);

    let detail = json!({
        "task": task,
        "project": project,
        "dependencies": dependencies,
        "comments": comments,
    });
    println!("{}", serde_json::to_string_pretty(&detail)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn upsert(
    id: Option<i64>,
    project_id: Option<i64>,
    title: Option<String>,
    done: Option<bool>,
    priority: Option<i32>,
    due_date: Option<DateTime<Utc>>,
    energy: Option<String>,
    estimated_minutes: Option<u32>,
) -> Result<(), Box<dyn std::error::Error>> {
    let energy: Option<EnergyLevel> = energy.map(|e| e.parse()).transpose()?;
    let (_, store) = super::connect()?;

    let (action, task) = match id {
        Some(id) => {
            let patch = TaskPatch {
                title,
                done,
                priority,
                due_date,
                energy,
                estimated_minutes,
            };
            if patch.is_empty() {
                return Err("nothing to update: pass at least one field".into());
            }
            ("updated", store.update_task(id, &patch).await?)
        }
        None => {
            let project_id = project_id.ok_or("--project-id is required for new tasks")?;
            let title = title.ok_or("--title is required for new tasks")?;
            let new_task = NewTask {
                title,
                project_id,
                priority,
                due_date,
                energy,
                estimated_minutes,
            };
            ("created", store.create_task(&new_task).await?)
        }
    };

    let mut response = json!({
        "action": action,
        "task": task,
    });
    if done == Some(true) {
        response["suggestion"] =
            json!("Task marked complete. Consider documenting what was done with `task comment`.");
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn add_comment(id: i64, comment: &str) -> Result<(), Box<dyn std::error::Error>> {
    if comment.trim().is_empty() {
        return Err("comment cannot be empty".into());
    }
    let (_, store) = super::connect()?;
    let created = store.add_comment(id, comment).await?;
    println!("{}", serde_json::to_string_pretty(&created)?);
    Ok(())
}

async fn bulk(
    ids: Vec<i64>,
    done: Option<bool>,
    priority: Option<i32>,
) -> Result<(), Box<dyn std::error::Error>> {
    if done.is_none() && priority.is_none() {
        return Err("at least one of --done or --priority must be provided".into());
    }
    if let Some(priority) = priority {
        if !(0..=5).contains(&priority) {
            return Err("priority must be between 0 and 5".into());
        }
    }
    let (_, store) = super::connect()?;

    let patch = TaskPatch {
        done,
        priority,
        ..TaskPatch::default()
    };
    let mut updated = Vec::new();
    let mut failed = Vec::new();
    for id in &ids {
        match store.update_task(*id, &patch).await {
            Ok(task) => updated.push(json!({"task_id": task.id, "title": task.title})),
            Err(e) => failed.push(json!({"task_id": id, "error": e.to_string()})),
        }
    }

    let summary = json!({
        "requested": ids.len(),
        "succeeded": updated.len(),
        "failed": failed.len(),
        "updated_tasks": updated,
        "failed_tasks": failed,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
