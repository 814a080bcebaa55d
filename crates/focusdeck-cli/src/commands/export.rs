//! JSON export of tasks to a local file.

use std::path::PathBuf;

use clap::Args;
use serde_json::json;

#[derive(Args)]
pub struct ExportArgs {
    /// Output file path
    #[arg(long)]
    output: PathBuf,
    /// Restrict to one project id
    #[arg(long)]
    project: Option<i64>,
    /// Include completed tasks
    #[arg(long)]
    include_done: bool,
    /// Include task comments (one extra request per task)
    #[arg(long)]
    include_comments: bool,
    /// Additional store filter expression
    #[arg(long)]
    filter: Option<String>,
    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,
}

pub async fn run(args: ExportArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (_, store) = super::connect()?;

    let mut parts: Vec<String> = Vec::new();
    if !args.include_done {
        parts.push("done = false".to_string());
    }
    if let Some(project) = args.project {
        parts.push(format!("project_id = {project}"));
    }
    if let Some(filter) = &args.filter {
        parts.push(format!("({filter})"));
    }
    let filter = if parts.is_empty() {
        None
    } else {
        Some(parts.join(" && "))
    };

    let tasks = store.all_tasks(filter.as_deref()).await?;

    let mut rows = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let mut row = serde_json::to_value(task)?;
        if args.include_comments {
            let comments = store.comments(task.id).await?;
            row["comments"] = serde_json::to_value(&comments)?;
        }
        rows.push(row);
    }

    let export = json!({
        "exported_at": chrono::Utc::now().to_rfc3339(),
        "task_count": rows.len(),
        "tasks": rows,
    });

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let body = if args.compact {
        serde_json::to_string(&export)?
    } else {
        serde_json::to_string_pretty(&export)?
    };
    std::fs::write(&args.output, &body)?;

    let receipt = json!({
        "file_path": args.output,
        "task_count": tasks.len(),
        "file_size": body.len(),
    });
    println!("{}", serde_json::to_string_pretty(&receipt)?);
    Ok(())
}
