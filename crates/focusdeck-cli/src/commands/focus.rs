//! Focus session command: the main engine invocation.

use clap::Args;

use focusdeck_core::{
    backend_from_settings, ContextTable, EnergyLevel, FocusEngine, FocusOptions, WorkMode,
};

#[derive(Args)]
pub struct FocusArgs {
    /// Current energy level: low, medium, high
    #[arg(long, default_value = "medium")]
    energy: String,
    /// Work mode: deep, quick, admin
    #[arg(long, default_value = "deep")]
    mode: String,
    /// Project you are currently working in
    #[arg(long)]
    current_project: Option<i64>,
    /// Maximum tasks to recommend (1-50)
    #[arg(long, default_value_t = 10)]
    max_tasks: usize,
    /// Session time budget in minutes (5-480)
    #[arg(long, default_value_t = 300)]
    max_minutes: u32,
    /// Restrict selection to these project ids (comma-separated)
    #[arg(long, value_delimiter = ',')]
    only_projects: Vec<i64>,
    /// Project ids to exclude (comma-separated)
    #[arg(long, value_delimiter = ',')]
    exclude_projects: Vec<i64>,
}

pub async fn run(args: FocusArgs) -> Result<(), Box<dyn std::error::Error>> {
    // Validate invocation parameters before touching config or network.
    let energy: EnergyLevel = args.energy.parse()?;
    let mode: WorkMode = args.mode.parse()?;
    let options = FocusOptions {
        energy,
        mode,
        current_project_id: args.current_project,
        max_tasks: args.max_tasks,
        max_minutes: args.max_minutes,
        only_projects: args.only_projects,
        exclude_projects: args.exclude_projects,
    };
    options.validate()?;

    let (settings, store) = super::connect()?;

    // Tasks and projects are independent reads; fetch them together.
    let (tasks, projects) = tokio::try_join!(store.all_tasks(None), store.projects())?;

    let contexts = ContextTable::load(settings.contexts.path.as_deref(), &projects);
    let engine = FocusEngine::new(contexts, backend_from_settings(&settings));
    let session = engine.build_session(&tasks, &options).await?;

    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}
