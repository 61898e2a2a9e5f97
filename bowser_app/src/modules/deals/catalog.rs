//! Mirrors the game catalog into the local store.

use std::collections::HashSet;

use bson::Bson;
use serenity::futures::TryStreamExt as _;
use utils::fuzzy::Search;

use super::model::CatalogGame;
use crate::modules::model_prelude::*;

/// Where catalog games are read from.
pub trait CatalogSource {
    /// Loads every game of the configured platform.
    fn games(&self) -> impl Future<Output = Result<Vec<CatalogGame>>> + Send;
}

/// The local copy of the catalog.
pub trait GameStore {
    fn find(&self, id: &Bson) -> impl Future<Output = Result<Option<CatalogGame>>> + Send;

    /// Inserts a game not known yet. It is marked as not released.
    fn insert(&self, game: &CatalogGame) -> impl Future<Output = Result> + Send;

    /// Overwrites every mirrored field of a known game.
    fn update(&self, game: &CatalogGame) -> impl Future<Output = Result> + Send;
}

/// Counts of what a sync pass did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Runs one sync pass, returning the games read from the catalog.
///
/// Any error aborts the pass. Games handled before the error keep their
/// new state.
pub async fn sync_catalog(
    source: &impl CatalogSource,
    store: &impl GameStore,
) -> Result<(Vec<CatalogGame>, SyncStats)> {
    let games = source.games().await.context("cannot load catalog games")?;
    let mut stats = SyncStats::default();

    for game in &games {
        // large catalogs shouldn't starve the other tasks
        tokio::task::yield_now().await;

        match store.find(&game.id).await? {
            None => {
                store.insert(game).await?;
                stats.inserted += 1;
            },
            Some(stored) if stored != *game => {
                log::debug!("Updating out of date game entry {}.", game.id);
                store.update(game).await?;
                stats.updated += 1;
            },
            Some(_) => stats.unchanged += 1,
        }
    }

    Ok((games, stats))
}

/// The catalog as of the last completed sync.
#[derive(Debug)]
pub struct CatalogSnapshot {
    pub synced_at: i64,
    pub games: Vec<CatalogGame>,
    /// Every distinct title, pointing at the index of its first game.
    titles: Search<usize>,
}

impl CatalogSnapshot {
    pub fn new(games: Vec<CatalogGame>, synced_at: i64) -> Self {
        let mut titles = Search::new();
        let mut seen = HashSet::new();
        for (index, game) in games.iter().enumerate() {
            for title in game.titles() {
                if seen.insert(title) {
                    titles.insert(title, index);
                }
            }
        }

        titles.shrink_to_fit();
        Self {
            synced_at,
            games,
            titles,
        }
    }

    pub fn titles(&self) -> &Search<usize> {
        &self.titles
    }
}

/// Reads games from the catalog database.
pub struct MongoCatalog {
    collection: Collection<CatalogGame>,
    platform: String,
}

impl MongoCatalog {
    pub fn new(db: &mongodb::Database, platform: &str) -> Self {
        Self {
            collection: CatalogGame::collection(db),
            platform: platform.to_owned(),
        }
    }
}

impl CatalogSource for MongoCatalog {
    async fn games(&self) -> Result<Vec<CatalogGame>> {
        let projection = doc! {
            "nsuids": 1,
            "titles": 1,
            "release_dates": 1,
            "categories": 1,
            "websites": 1,
            "scores.metascore": 1,
            "scores.userscore": 1,
            "free_to_play": 1,
        };

        let games = self
            .collection
            .find(doc! { "system": self.platform.as_str() })
            .projection(projection)
            .await?
            .try_collect()
            .await?;

        Ok(games)
    }
}

/// The local `games` collection.
pub struct MongoGameStore {
    collection: Collection<CatalogGame>,
}

impl MongoGameStore {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: CatalogGame::collection(db),
        }
    }
}

impl GameStore for MongoGameStore {
    async fn find(&self, id: &Bson) -> Result<Option<CatalogGame>> {
        let game = self.collection.find_one(doc! { "_id": id.clone() }).await?;
        Ok(game)
    }

    async fn insert(&self, game: &CatalogGame) -> Result {
        let mut doc = bson::serialize_to_document(game)?;
        doc.insert("released", false);
        self.collection
            .clone_with_type::<Document>()
            .insert_one(doc)
            .await?;
        Ok(())
    }

    async fn update(&self, game: &CatalogGame) -> Result {
        let mut fields = bson::serialize_to_document(game)?;
        fields.remove("_id");
        self.collection
            .update_one(doc! { "_id": game.id.clone() }, doc! { "$set": fields })
            .await?;
        Ok(())
    }
}
