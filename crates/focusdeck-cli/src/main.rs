use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusdeck", version, about = "Focusdeck CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a focus session recommendation
    Focus(commands::focus::FocusArgs),
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// List tasks with dependency annotations
    List(commands::list::ListArgs),
    /// Export tasks to a local JSON file
    Export(commands::export::ExportArgs),
    /// Show effective project contexts
    Projects,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout is reserved for command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Focus(args) => commands::focus::run(args).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::List(args) => commands::list::run(args).await,
        Commands::Export(args) => commands::export::run(args).await,
        Commands::Projects => commands::projects::run().await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
