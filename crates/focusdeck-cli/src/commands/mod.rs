pub mod export;
pub mod focus;
pub mod list;
pub mod projects;
pub mod task;

use focusdeck_core::{Settings, TaskStore};

/// Load settings and build a store client, the common command preamble.
pub fn connect() -> Result<(Settings, TaskStore), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let store = TaskStore::from_settings(&settings)?;
    Ok((settings, store))
}
