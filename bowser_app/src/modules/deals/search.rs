//! The `games search` command.

use indexmap::IndexMap;
use serenity::futures::TryStreamExt as _;
use utils::text::{WriteStr as _, truncate};

use super::catalog::CatalogSnapshot;
use super::model::{Amount, CatalogGame, PriceRecord, SaleResponse};
use super::regions::flag_or_code;
use crate::data::ERROR_EMBED_COLOR;
use crate::helper::bson::ModelCollection;
use crate::modules::prelude::*;

/// Fuzzy matches must score above this to be accepted.
const MIN_SCORE: u8 = 85;

const FOUND_COLOR: Colour = Colour::new(0x50_E3_C2);

impl ModelCollection for PriceRecord {
    const COLLECTION_NAME: &str = "prices";
}

/// Outcome of looking up a title.
#[derive(Debug)]
pub enum Resolved<'a> {
    Found {
        title: &'a str,
        game: &'a CatalogGame,
    },
    NoMatch {
        suggestions: Vec<&'a str>,
    },
}

/// Finds the game for a query.
///
/// An exact title match, ignoring case, always wins. Otherwise the best
/// fuzzy match is used if it is good enough.
pub fn resolve<'a>(snapshot: &'a CatalogSnapshot, query: &str) -> Resolved<'a> {
    let titles = snapshot.titles();
    if let Some(exact) = titles.find_exact(query) {
        return found(snapshot, exact.text, *exact.data);
    }

    let matches = titles.search(query, 3);
    match matches.first() {
        Some(best) if best.score > MIN_SCORE => found(snapshot, best.text, *best.data),
        _ => Resolved::NoMatch {
            suggestions: matches.iter().map(|m| m.text).collect(),
        },
    }
}

fn found<'a>(snapshot: &'a CatalogSnapshot, title: &'a str, index: usize) -> Resolved<'a> {
    Resolved::Found {
        title,
        game: &snapshot.games[index],
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct GamePrice<'a> {
    full: Option<&'a Amount>,
    sale: Option<&'a Amount>,
    discount: Option<&'a Amount>,
}

/// Renders the price table for a game.
///
/// Live sale prices come first. Regions only known from the price history
/// follow with their full price.
pub fn price_table(
    game: &CatalogGame,
    sales: Option<&SaleResponse>,
    history: &[PriceRecord],
) -> String {
    if history.is_empty() {
        return "*There is no available price data for this game*".to_owned();
    }

    let mut prices: IndexMap<&str, GamePrice<'_>> = IndexMap::new();
    let live = sales.and_then(|s| s.games_on_sale.iter().find(|l| l.titles == game.titles));
    if let Some(live) = live {
        for (region, price) in &live.price {
            prices.insert(
                region,
                GamePrice {
                    full: price.full_price.as_ref(),
                    sale: price.sale_price.as_ref(),
                    discount: price.discount.as_ref(),
                },
            );
        }
    }

    for record in history {
        for (region, price) in &record.prices {
            prices.entry(region).or_insert(GamePrice {
                full: price.full_price.as_ref(),
                ..GamePrice::default()
            });
        }
    }

    let mut desc = "Price data:\n\n".to_owned();
    for (index, (region, price)) in prices.iter().enumerate() {
        if index != 0 && index % 2 == 0 {
            desc.push('\n');
        }

        let flag = flag_or_code(region);
        let currency = sales.map_or("", |s| s.currency(region));
        let full = Price(price.full);

        match (price.discount, price.sale) {
            (Some(discount), Some(sale)) => {
                let text = format!("{flag} ~~{currency}{full}~~ {currency}{sale} (-{discount}%)");
                match game.website(region) {
                    Some(url) => write!(desc, "[{text}]({url}) "),
                    None => write!(desc, "{text} "),
                }
            },
            _ => write!(desc, "{flag} {currency}{full} "),
        }
    }

    desc
}

struct Price<'a>(Option<&'a Amount>);

impl std::fmt::Display for Price<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(amount) => amount.fmt(f),
            None => f.write_str("N/a"),
        }
    }
}

fn no_match_embed(query: &str, suggestions: &[&str]) -> CreateEmbed {
    let mut desc = format!(
        "Unable to find a game with the title of **{}**.",
        truncate(query, 100)
    );

    if !suggestions.is_empty() {
        write!(desc, " Did you mean...\n\n*{}*", suggestions.join("\n"));
    }

    CreateEmbed::new()
        .title("No game found")
        .description(desc)
        .color(ERROR_EMBED_COLOR)
        .timestamp(Timestamp::now())
}

async fn load_history(db: &mongodb::Database, game: &CatalogGame) -> Result<Vec<PriceRecord>> {
    let records = PriceRecord::collection(db)
        .find(bson::doc! { "game_id": game.id.clone() })
        .await?
        .try_collect()
        .await
        .context("cannot load price history")?;
    Ok(records)
}

/// Whether the invoker may search games.
pub fn can_search(ctx: &CommandContext<'_>) -> bool {
    ctx.config()
        .deals
        .as_ref()
        .is_some_and(|c| c.roles.is_empty() || ctx.has_any_role(&c.roles))
}

pub async fn search(ctx: CommandContext<'_>, args: Args<'_>) -> Result {
    let config = ctx.config().deals()?;
    let query = args.rest();
    if query.is_empty() {
        return Err(HArgError::new_const("Missing argument `game`.").into());
    }

    let Some(snapshot) = config.state.catalog.load_full() else {
        return Err(HArgError::new_const(
            "The game list is still loading. Try again in a few minutes.",
        )
        .into());
    };

    let (title, game) = match resolve(&snapshot, query) {
        Resolved::Found { title, game } => (title, game),
        Resolved::NoMatch { suggestions } => {
            let message = CreateMessage::new()
                .content(ctx.author().mention().to_string())
                .embed(no_match_embed(query, &suggestions));
            ctx.send(message).await?;
            return Ok(());
        },
    };

    let history = load_history(config.state.catalog_db()?, game).await?;
    let sales = config.state.sales.load_full();
    let desc = price_table(game, sales.as_deref().map(|s| &s.data), &history);

    let embed = CreateEmbed::new()
        .title(title)
        .description(desc)
        .color(FOUND_COLOR);

    ctx.send(CreateMessage::new().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use bson::{Bson, Document};
    use indexmap::IndexMap;

    use super::*;
    use crate::modules::deals::model::{
        CatalogScores, Country, HistoricalPrice, RegionPrice, SaleListing,
    };

    fn game(id: i32, titles: &[(&str, &str)]) -> CatalogGame {
        CatalogGame {
            id: Bson::Int32(id),
            nsuids: Document::new(),
            titles: titles
                .iter()
                .map(|(r, t)| ((*r).to_owned(), Some((*t).to_owned())))
                .collect(),
            release_dates: IndexMap::new(),
            categories: Vec::new(),
            websites: [("US".to_owned(), Some("https://example.com/celeste".to_owned()))]
                .into_iter()
                .collect(),
            scores: CatalogScores::default(),
            free_to_play: None,
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                game(1, &[("NA", "Super Mario Odyssey")]),
                game(2, &[("NA", "Mario Kart 8 Deluxe")]),
                game(3, &[("NA", "Splatoon 2"), ("JP", "スプラトゥーン2")]),
                game(4, &[("NA", "Celeste")]),
            ],
            0,
        )
    }

    #[test]
    fn exact_match_wins() {
        let snapshot = snapshot();
        match resolve(&snapshot, "splatoon 2") {
            Resolved::Found { title, game } => {
                assert_eq!(title, "Splatoon 2");
                assert_eq!(game.id, Bson::Int32(3));
            },
            Resolved::NoMatch { .. } => panic!("expected exact match"),
        }
    }

    #[test]
    fn exact_match_any_region_title() {
        let snapshot = snapshot();
        assert!(matches!(
            resolve(&snapshot, "スプラトゥーン2"),
            Resolved::Found { game, .. } if game.id == Bson::Int32(3)
        ));
    }

    #[test]
    fn fuzzy_match_accepted() {
        let snapshot = snapshot();
        assert!(matches!(
            resolve(&snapshot, "mario odysey"),
            Resolved::Found { title: "Super Mario Odyssey", .. }
        ));
    }

    #[test]
    fn poor_match_suggests() {
        let snapshot = snapshot();
        match resolve(&snapshot, "qqqqqqqq") {
            Resolved::NoMatch { suggestions } => assert_eq!(suggestions.len(), 3),
            Resolved::Found { title, .. } => panic!("unexpected match {title}"),
        }
    }

    fn sales_for(game: &CatalogGame) -> SaleResponse {
        let price = |full: f64, sale: f64, discount: i64| RegionPrice {
            full_price: Some(Amount::Float(full)),
            sale_price: Some(Amount::Float(sale)),
            discount: Some(Amount::Int(discount)),
        };

        SaleResponse {
            games_on_sale: vec![SaleListing {
                titles: game.titles.clone(),
                price: [("US".to_owned(), price(20.0, 5.0, 75)), ("EU".to_owned(), price(20.0, 10.0, 50))]
                    .into_iter()
                    .collect(),
                ..SaleListing::default()
            }],
            countries: [("US", "$"), ("EU", "€"), ("JP", "¥")]
                .into_iter()
                .map(|(r, c)| {
                    (r.to_owned(), Country {
                        currency: Some(c.to_owned()),
                    })
                })
                .collect(),
        }
    }

    fn history(regions: &[(&str, i64)]) -> PriceRecord {
        PriceRecord {
            prices: regions
                .iter()
                .map(|(r, p)| {
                    (
                        (*r).to_owned(),
                        HistoricalPrice {
                            full_price: Some(Amount::Int(*p)),
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn price_table_without_history() {
        let game = game(4, &[("NA", "Celeste")]);
        let sales = sales_for(&game);
        assert_eq!(
            price_table(&game, Some(&sales), &[]),
            "*There is no available price data for this game*"
        );
    }

    #[test]
    fn price_table_merges_live_and_history() {
        let game = game(4, &[("NA", "Celeste")]);
        let sales = sales_for(&game);
        let records = [history(&[("US", 20), ("JP", 2050)])];

        assert_eq!(
            price_table(&game, Some(&sales), &records),
            "Price data:\n\n\
             [🇺🇸 ~~$20.0~~ $5.0 (-75%)](https://example.com/celeste) 🇪🇺 ~~€20.0~~ €10.0 (-50%) \n\
             🇯🇵 ¥2050 "
        );
    }

    #[test]
    fn price_table_history_only() {
        let game = game(4, &[("NA", "Celeste")]);
        let records = [history(&[("US", 20)])];

        assert_eq!(price_table(&game, None, &records), "Price data:\n\n🇺🇸 20 ");
    }
}
