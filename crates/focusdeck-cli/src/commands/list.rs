//! Filtered task listing with dependency annotations.

use clap::Args;
use serde_json::json;

use focusdeck_core::DependencyGraph;

#[derive(Args)]
pub struct ListArgs {
    /// Store filter expression (e.g. 'done = false && priority >= 3')
    #[arg(long)]
    filter: Option<String>,
    /// Restrict to one project id
    #[arg(long)]
    project: Option<i64>,
    /// Maximum tasks to print
    #[arg(long, default_value_t = 50)]
    limit: usize,
}

pub async fn run(args: ListArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = super::connect()?;

    let mut parts: Vec<String> = Vec::new();
    if let Some(filter) = &args.filter {
        parts.push(format!("({filter})"));
    }
    if let Some(project) = args.project {
        parts.push(format!("project_id = {project}"));
    }
    let filter = if parts.is_empty() {
        None
    } else {
        Some(parts.join(" && "))
    };

    let tasks = store.all_tasks(filter.as_deref()).await?;
    let graph = DependencyGraph::build(&tasks);

    let rows: Vec<serde_json::Value> = tasks
        .iter()
        .take(args.limit)
        .map(|task| {
            let ann = graph.annotation(task.id);
            json!({
                "id": task.id,
                "title": task.title,
                "done": task.done,
                "priority": task.priority,
                "due_date": task.due_date,
                "project_id": task.project_id,
                "energy": task.energy,
                "estimated_minutes": task.estimated_minutes,
                "is_blocked": ann.map(|a| a.is_blocked),
                "blocked_by_ids": ann.map(|a| &a.blocked_by_ids),
                "blocking_ids": ann.map(|a| &a.blocking_ids),
            })
        })
        .collect();

    let listing = json!({
        "total": tasks.len(),
        "filter": filter,
        "tasks": rows,
    });
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}
