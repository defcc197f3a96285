use anyhow::Result;
use tracing::info;

use crate::store::{
    entities::{ConfigUpdate, Settings},
    StoreRepository,
};

pub fn render_settings(settings: &Settings) -> String {
    [
        ConfigUpdate::DailyGoal(settings.daily_goal_minutes).to_string(),
        ConfigUpdate::WorkDays(settings.work_days.clone()).to_string(),
    ]
    .join("\n")
}

/// Applies `update` when given, then prints the effective settings. Invalid input never reaches
/// this point because clap rejects it while parsing.
pub async fn process_config_command(
    update: Option<ConfigUpdate>,
    repository: impl StoreRepository,
) -> Result<()> {
    let mut store = repository.load().await?;
    if let Some(update) = update {
        store.apply_config(update);
        repository.save(&store).await?;
        info!("Saved settings");
    }
    println!("{}", render_settings(store.settings()));
    Ok(())
}
