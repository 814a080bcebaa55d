//! Effective project context listing.

use focusdeck_core::ContextTable;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, store) = super::connect()?;

    let projects = store.projects().await?;
    let contexts = ContextTable::load(settings.contexts.path.as_deref(), &projects);
    let enriched = contexts.enrich(&projects);

    println!("{}", serde_json::to_string_pretty(&enriched)?);
    Ok(())
}
