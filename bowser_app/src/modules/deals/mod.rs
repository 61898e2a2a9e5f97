use serenity::prelude::*;
use tokio::task::JoinHandle;

use super::prelude::*;

mod api;
mod catalog;
pub mod config;
mod model;
mod ranking;
mod regions;
mod search;
mod tasks;

pub use config::Config;

pub struct Module;

impl super::Module for Module {
    fn enabled(&self, config: &HBotConfig) -> bool {
        config.deals.is_some()
    }

    fn intents(&self, _config: &HBotConfig) -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES
    }

    fn commands(&self, _config: &HBotConfig) -> impl IntoIterator<Item = Command> {
        [command!("games search", search::search, check = search::can_search)]
    }

    fn validate(&self, config: &HBotConfig) -> Result {
        let deals = config.deals()?;
        anyhow::ensure!(
            config.mongodb_uri.is_some(),
            "deals requires a `bot.mongodb_uri` to store the game list"
        );
        anyhow::ensure!(!deals.api_key.is_empty(), "`deals.api_key` must not be empty");
        anyhow::ensure!(
            !deals.sync_interval.is_zero() && !deals.refresh_interval.is_zero(),
            "deals intervals must not be zero"
        );

        log::info!("Deals are enabled.");
        Ok(())
    }

    async fn startup(self, data: Arc<HBotData>) -> Result {
        let deals = data.config().deals()?;
        let client = mongodb::Client::with_uri_str(&deals.catalog_uri)
            .await
            .context("failed to connect to deals catalog")?;

        deals
            .state
            .set_catalog_db(client.database(&deals.catalog_database))?;

        log::info!("Connected to deals catalog.");
        Ok(())
    }

    fn tasks(self, ctx: &Context, data: &Arc<HBotData>) -> Vec<JoinHandle<()>> {
        let Some(deals) = &data.config().deals else {
            return Vec::new();
        };

        vec![
            tasks::spawn_catalog_sync(Arc::clone(data), deals.sync_interval),
            tasks::spawn_deals_refresh(
                Arc::clone(data),
                Arc::clone(&ctx.http),
                deals.refresh_interval,
            ),
        ]
    }
}
