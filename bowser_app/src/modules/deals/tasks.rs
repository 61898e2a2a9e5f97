//! The periodic catalog sync and deals refresh.

use std::fmt::Display;
use std::time::Duration;

use serenity::http::Http;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::api::fetch_sales;
use super::catalog::{CatalogSnapshot, MongoCatalog, MongoGameStore, sync_catalog};
use super::config::State;
use super::model::{SaleResponse, SaleSnapshot};
use super::ranking::build_messages;
use crate::helper::time::now_unix;
use crate::prelude::*;

/// Spawns a task running `tick` every `period`, starting immediately.
fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            log::debug!("Starting {name}.");
            if let Err(why) = tick().await {
                log::error!("{name} failed: {why:?}");
            }
        }
    })
}

pub fn spawn_catalog_sync(data: Arc<HBotData>, period: Duration) -> JoinHandle<()> {
    spawn_periodic("catalog sync", period, move || {
        let data = Arc::clone(&data);
        async move { sync_once(&data).await }
    })
}

pub fn spawn_deals_refresh(
    data: Arc<HBotData>,
    http: Arc<Http>,
    period: Duration,
) -> JoinHandle<()> {
    spawn_periodic("deals refresh", period, move || {
        let data = Arc::clone(&data);
        let http = Arc::clone(&http);
        async move { refresh_once(&data, &http).await }
    })
}

async fn sync_once(data: &HBotData) -> Result {
    let config = data.config().deals()?;
    let source = MongoCatalog::new(config.state.catalog_db()?, &config.platform);
    let store = MongoGameStore::new(data.database()?);

    let (games, stats) = sync_catalog(&source, &store).await?;
    let snapshot = CatalogSnapshot::new(games, now_unix());
    log::info!(
        "Catalog synced: {} games, {} new, {} updated.",
        snapshot.games.len(),
        stats.inserted,
        stats.updated
    );

    config.state.catalog.store(Some(Arc::new(snapshot)));
    Ok(())
}

/// Where the current sales are fetched from.
pub trait SaleSource {
    fn sales(&self) -> impl Future<Output = Result<SaleResponse>> + Send;
}

/// The channel the deals list is posted to.
pub trait DealsBoard {
    fn delete(&self, message_id: MessageId) -> impl Future<Output = Result> + Send;
    fn post(&self, content: String) -> impl Future<Output = Result<MessageId>> + Send;
}

struct ApiSales<'a> {
    http: &'a reqwest::Client,
    url: &'a str,
    api_key: &'a str,
}

impl SaleSource for ApiSales<'_> {
    async fn sales(&self) -> Result<SaleResponse> {
        Ok(fetch_sales(self.http, self.url, self.api_key).await?)
    }
}

struct ChannelBoard<'a> {
    http: &'a Http,
    channel: ChannelId,
}

impl DealsBoard for ChannelBoard<'_> {
    async fn delete(&self, message_id: MessageId) -> Result {
        self.channel.delete_message(self.http, message_id).await?;
        Ok(())
    }

    async fn post(&self, content: String) -> Result<MessageId> {
        let msg = self.channel.say(self.http, content).await?;
        Ok(msg.id)
    }
}

async fn refresh_once(data: &HBotData, http: &Http) -> Result {
    let config = data.config().deals()?;
    let source = ApiSales {
        http: data.http(),
        url: &config.api_url,
        api_key: &config.api_key,
    };
    let board = ChannelBoard {
        http,
        channel: config.channel,
    };

    let emoji = &data.config().emojis.bar_chart;
    let count = refresh_deals(&source, &board, &config.state, emoji, now_unix()).await?;
    log::info!("Posted {count} deals messages.");
    Ok(())
}

/// Replaces the posted deals list with a freshly fetched one.
///
/// The old messages are deleted even if the fetch fails, and the stored sales
/// are only replaced on success. Afterwards, `posted` holds exactly the
/// messages that made it into the channel.
pub async fn refresh_deals(
    source: &impl SaleSource,
    board: &impl DealsBoard,
    state: &State,
    bar_chart: &impl Display,
    now: i64,
) -> Result<usize> {
    let mut posted = state.posted.lock().await;

    for message_id in posted.drain(..) {
        if let Err(why) = board.delete(message_id).await {
            log::warn!("Could not delete old deals message {message_id}: {why:?}");
        }
    }

    let sales = source.sales().await?;
    let messages = build_messages(&sales, now, bar_chart);

    state.sales.store(Some(Arc::new(SaleSnapshot {
        fetched_at: now,
        data: sales,
    })));

    for content in messages {
        let message_id = board
            .post(content)
            .await
            .context("failed to post deals message")?;
        posted.push(message_id);
    }

    Ok(posted.len())
}
