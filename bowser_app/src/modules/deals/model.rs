//! Data from the deals API and the game catalog.

use std::fmt;

use bson::Bson;
use indexmap::IndexMap;

use crate::modules::model_prelude::*;

/// Response body of the deals API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleResponse {
    #[serde(default)]
    pub games_on_sale: Vec<SaleListing>,
    /// Currency info, keyed by region code.
    #[serde(default)]
    pub countries: IndexMap<String, Country>,
}

impl SaleResponse {
    /// Gets the currency symbol for a region, or an empty string.
    pub fn currency(&self, region: &str) -> &str {
        self.countries
            .get(region)
            .and_then(|c| c.currency.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Country {
    pub currency: Option<String>,
}

/// A game currently on sale.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleListing {
    /// Titles keyed by region (`NA`, `EU`, `JP`).
    #[serde(default)]
    pub titles: IndexMap<String, Option<String>>,
    #[serde(default)]
    pub scores: Scores,
    /// Prices keyed by region code, in API order.
    #[serde(default)]
    pub price: IndexMap<String, RegionPrice>,
}

impl SaleListing {
    fn title(&self, region: &str) -> Option<&str> {
        self.titles
            .get(region)
            .and_then(Option::as_deref)
            .filter(|t| !t.is_empty())
    }

    /// The English title: the NA one if set, else the EU one.
    pub fn english_title(&self) -> Option<&str> {
        self.title("NA").or_else(|| self.title("EU"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scores {
    pub metascore: Option<ScoreValue>,
    pub userscore: Option<ScoreValue>,
}

/// A review score. The API uses `"-"` for games without one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScoreValue {
    /// Numeric value used for ranking. Missing or non-numeric scores are 0.
    pub fn rank(score: Option<&Self>) -> f64 {
        match score {
            Some(Self::Int(v)) => *v as f64,
            Some(Self::Float(v)) => *v,
            Some(Self::Text(v)) => v.trim().parse().unwrap_or(0.0),
            None => 0.0,
        }
    }

    /// Shows the score, or `N/a` if there is none.
    pub fn display(score: Option<&Self>) -> ScoreDisplay<'_> {
        ScoreDisplay(score)
    }
}

pub struct ScoreDisplay<'a>(Option<&'a ScoreValue>);

impl fmt::Display for ScoreDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ScoreValue::Int(v)) => write!(f, "{v}"),
            Some(ScoreValue::Float(v)) => write!(f, "{v:?}"),
            Some(ScoreValue::Text(v)) if v != "-" && !v.is_empty() => f.write_str(v),
            _ => f.write_str("N/a"),
        }
    }
}

/// A price or discount as sent by the API, either a number or a string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            // keeps the `.0` of whole numbers
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// Price of a game in one region.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegionPrice {
    pub full_price: Option<Amount>,
    pub sale_price: Option<Amount>,
    /// Discount in percent. Absent when the game isn't on sale there.
    pub discount: Option<Amount>,
}

/// A sale response along with when it was fetched.
#[derive(Debug)]
pub struct SaleSnapshot {
    pub fetched_at: i64,
    pub data: SaleResponse,
}

/// The fields mirrored from the catalog for each game.
///
/// Values are kept as they are stored upstream so comparisons are exact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogGame {
    #[serde(rename = "_id")]
    pub id: Bson,
    #[serde(default)]
    pub nsuids: Document,
    #[serde(default)]
    pub titles: IndexMap<String, Option<String>>,
    #[serde(default)]
    pub release_dates: IndexMap<String, Option<bson::DateTime>>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub websites: IndexMap<String, Option<String>>,
    #[serde(default)]
    pub scores: CatalogScores,
    #[serde(default)]
    pub free_to_play: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogScores {
    #[serde(default)]
    pub metascore: Bson,
    #[serde(default)]
    pub userscore: Bson,
}

impl CatalogGame {
    /// All non-empty titles of this game.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.titles
            .values()
            .filter_map(Option::as_deref)
            .filter(|t| !t.is_empty())
    }

    pub fn website(&self, region: &str) -> Option<&str> {
        self.websites.get(region).and_then(Option::as_deref)
    }
}

/// Both the catalog and the local store keep games in `games`.
///
/// Local documents carry an extra `released` flag that isn't part of the
/// mirrored fields and is ignored when reading.
impl ModelCollection for CatalogGame {
    const COLLECTION_NAME: &str = "games";
}

/// Historical prices for a game from the catalog's `prices` collection.
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRecord {
    #[serde(default)]
    pub prices: IndexMap<String, HistoricalPrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalPrice {
    pub full_price: Option<Amount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_sale_response() {
        let json = r#"{
            "games_on_sale": [{
                "titles": {"NA": "Celeste", "EU": "Celeste", "JP": null},
                "scores": {"metascore": 92, "userscore": "-"},
                "price": {
                    "US": {"full_price": 19.99, "sale_price": 4.99, "discount": 75},
                    "JP": {"full_price": "2050", "sale_price": "2050"}
                }
            }],
            "countries": {"US": {"currency": "$"}, "JP": {"currency": "¥"}}
        }"#;

        let resp: SaleResponse = serde_json::from_str(json).expect("must parse");
        let listing = &resp.games_on_sale[0];
        assert_eq!(listing.english_title(), Some("Celeste"));
        assert_eq!(ScoreValue::rank(listing.scores.metascore.as_ref()), 92.0);
        assert_eq!(
            ScoreValue::display(listing.scores.userscore.as_ref()).to_string(),
            "N/a"
        );

        let us = &listing.price["US"];
        assert_eq!(us.sale_price.as_ref().map(ToString::to_string).as_deref(), Some("4.99"));
        assert_eq!(us.discount, Some(Amount::Int(75)));
        assert_eq!(listing.price["JP"].discount, None);
        assert_eq!(listing.price["JP"].full_price.as_ref().map(ToString::to_string).as_deref(), Some("2050"));

        assert_eq!(resp.currency("US"), "$");
        assert_eq!(resp.currency("GB"), "");
    }

    #[test]
    fn english_title_falls_back_to_eu() {
        let listing = SaleListing {
            titles: [
                ("NA".to_owned(), Some(String::new())),
                ("EU".to_owned(), Some("Hollow Knight".to_owned())),
            ]
            .into_iter()
            .collect(),
            ..SaleListing::default()
        };

        assert_eq!(listing.english_title(), Some("Hollow Knight"));
        assert_eq!(SaleListing::default().english_title(), None);
    }

    #[test]
    fn stored_game_ignores_released() {
        let doc = doc! {
            "_id": 7,
            "titles": { "NA": "Splatoon 2", "EU": null },
            "scores": { "metascore": 83, "userscore": "8.6" },
            "free_to_play": false,
            "released": true,
        };

        let game: CatalogGame = bson::deserialize_from_document(doc).expect("must parse");
        assert_eq!(game.id, Bson::Int32(7));
        assert_eq!(game.titles().collect::<Vec<_>>(), ["Splatoon 2"]);
        assert_eq!(game.scores.userscore, Bson::String("8.6".to_owned()));
    }

    #[test]
    fn whole_floats_keep_fraction() {
        assert_eq!(Amount::Float(4.0).to_string(), "4.0");
        assert_eq!(Amount::Float(29.99).to_string(), "29.99");
        assert_eq!(Amount::Int(4).to_string(), "4");
        assert_eq!(ScoreValue::display(Some(&ScoreValue::Float(8.0))).to_string(), "8.0");
    }
}
