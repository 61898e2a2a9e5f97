use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use serde_with::serde_as;

use super::catalog::CatalogSnapshot;
use super::model::SaleSnapshot;
use crate::helper::time::Dhms;
use crate::prelude::*;

fn default_catalog_database() -> String {
    "nintendeals".to_owned()
}

fn default_platform() -> String {
    "Switch".to_owned()
}

const fn default_sync_interval() -> Duration {
    Duration::from_secs(12 * 60 * 60)
}

const fn default_refresh_interval() -> Duration {
    Duration::from_secs(4 * 60 * 60)
}

#[serde_as]
#[derive(Debug, serde::Deserialize)]
pub struct Config {
    /// Connection string for the deals catalog.
    pub catalog_uri: String,
    #[serde(default = "default_catalog_database")]
    pub catalog_database: String,
    /// Value of the `system` field of catalog games to mirror.
    #[serde(default = "default_platform")]
    pub platform: String,

    pub api_url: String,
    pub api_key: String,
    /// Where the deals list is posted.
    pub channel: ChannelId,

    #[serde_as(as = "Dhms")]
    #[serde(default = "default_sync_interval")]
    pub sync_interval: Duration,
    #[serde_as(as = "Dhms")]
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: Duration,

    /// Roles allowed to use `games search`. Empty allows everyone.
    #[serde(default)]
    pub roles: Vec<RoleId>,

    #[serde(skip)]
    pub state: State,
}

/// Runtime state shared between the tasks and the search command.
#[derive(Default)]
pub struct State {
    /// Present once the first catalog sync completed.
    pub catalog: ArcSwapOption<CatalogSnapshot>,
    /// The sales of the last successful refresh.
    pub sales: ArcSwapOption<SaleSnapshot>,
    /// Messages of the last posted deals list.
    pub posted: tokio::sync::Mutex<Vec<MessageId>>,
    catalog_db: OnceLock<mongodb::Database>,
}

impl State {
    pub fn catalog_db(&self) -> Result<&mongodb::Database> {
        self.catalog_db
            .get()
            .context("deals catalog is not connected")
    }

    pub fn set_catalog_db(&self, db: mongodb::Database) -> Result {
        self.catalog_db
            .set(db)
            .map_err(|_| anyhow::anyhow!("deals catalog is already connected"))
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let catalog = self.catalog.load_full();
        let sales = self.sales.load_full();
        f.debug_struct("State")
            .field("catalog_synced_at", &catalog.as_ref().map(|c| c.synced_at))
            .field("catalog_games", &catalog.as_ref().map(|c| c.games.len()))
            .field("sales_fetched_at", &sales.as_ref().map(|s| s.fetched_at))
            .finish_non_exhaustive()
    }
}
