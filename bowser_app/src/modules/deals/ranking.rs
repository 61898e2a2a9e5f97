//! Turns a sale response into the posted deals list.

use std::fmt::Display;

use indexmap::IndexMap;
use utils::text::{WriteStr as _, truncate};

use super::model::{SaleListing, SaleResponse, ScoreValue};
use super::regions::{DEAL_REGIONS, flag_or_code};
use crate::helper::time::{UPDATED_FORMAT, format_unix};

/// Maximum characters per posted message.
pub const MESSAGE_BUDGET: usize = 1990;

/// Amount of listings considered for the post.
pub const MAX_LISTINGS: usize = 20;

/// Marks every entry, and every message after the first.
const ZERO_WIDTH_SPACE: char = '\u{200b}';

/// A listing selected for the deals post.
#[derive(Debug, Clone, Copy)]
pub struct RankedListing<'a> {
    pub title: &'a str,
    pub listing: &'a SaleListing,
}

/// Selects the top listings by metascore.
///
/// Listings without an English title or a US price are dropped. Listings with
/// the same title collapse into one, keeping the position of the first and the
/// data of the last. Equal scores keep their order.
pub fn rank(resp: &SaleResponse) -> Vec<RankedListing<'_>> {
    let mut by_title: IndexMap<&str, &SaleListing> = IndexMap::new();
    for listing in &resp.games_on_sale {
        let Some(title) = listing.english_title() else {
            continue;
        };

        if !listing.price.contains_key("US") {
            continue;
        }

        by_title.insert(title, listing);
    }

    let mut ranked: Vec<_> = by_title
        .into_iter()
        .map(|(title, listing)| RankedListing { title, listing })
        .collect();

    ranked.sort_by(|a, b| metascore(b).total_cmp(&metascore(a)));
    ranked.truncate(MAX_LISTINGS);
    ranked
}

fn metascore(r: &RankedListing<'_>) -> f64 {
    ScoreValue::rank(r.listing.scores.metascore.as_ref())
}

/// Renders one listing, or [`None`] if it has no discount in any of the
/// shown regions.
pub fn render_entry(
    ranked: RankedListing<'_>,
    resp: &SaleResponse,
    bar_chart: &impl Display,
) -> Option<String> {
    let RankedListing { title, listing } = ranked;

    let mut prices = String::new();
    let mut count = 0usize;
    for (region, price) in &listing.price {
        if !DEAL_REGIONS.contains(&region.as_str()) {
            continue;
        }

        let (Some(discount), Some(sale_price)) = (&price.discount, &price.sale_price) else {
            continue;
        };

        count += 1;
        if count == 3 {
            prices.push('\n');
        }

        write!(
            prices,
            "{} {}{sale_price} (-{discount}%) ",
            flag_or_code(region),
            resp.currency(region),
        );
    }

    if count == 0 {
        return None;
    }

    let scores = &listing.scores;
    Some(format!(
        "{ZERO_WIDTH_SPACE}\n\n**{title}**\n{bar_chart} ___Metascore:___ *{}* ___Userscore:___ *{}*\n{prices}",
        ScoreValue::display(scores.metascore.as_ref()),
        ScoreValue::display(scores.userscore.as_ref()),
    ))
}

/// The text the first message starts with.
pub fn render_header(now: i64) -> String {
    format!(
        "**Nintendo Switch Game Deals**\nLast updated {}\n\n\
         This deals list is updated 4 times each day to contain the 20 top metascore rated games currently on sale. \n\
         > Note: This list only includes games which have prices in USD\n\
         > Game sale date provided gratefully by <http://www.nintendeals.xyz/>\n{}",
        format_unix(now, UPDATED_FORMAT),
        "-".repeat(30),
    )
}

/// Packs the header and entries into messages of at most `budget`
/// characters.
///
/// Messages after the first drop the leading blank line of their first entry,
/// so they start with a zero-width space and a single newline.
pub fn paginate(header: &str, entries: &[String], budget: usize) -> Vec<String> {
    let mut messages = Vec::new();
    let mut chunk = truncate(header, budget).into_owned();
    let mut chunk_len = chunk.chars().count();

    for entry in entries {
        let entry = truncate(entry, budget);
        let entry_len = entry.chars().count();

        if chunk_len + entry_len <= budget {
            chunk.push_str(&entry);
            chunk_len += entry_len;
            continue;
        }

        let done = std::mem::replace(&mut chunk, entry.into_owned());
        chunk_len = entry_len;
        push_chunk(&mut messages, done);
    }

    push_chunk(&mut messages, chunk);
    messages
}

fn push_chunk(messages: &mut Vec<String>, chunk: String) {
    if messages.is_empty() {
        messages.push(chunk);
    } else {
        let mut out = String::with_capacity(chunk.len());
        out.push(ZERO_WIDTH_SPACE);
        out.extend(chunk.chars().skip(2));
        messages.push(out);
    }
}

/// Builds all messages for the deals post.
pub fn build_messages(resp: &SaleResponse, now: i64, bar_chart: &impl Display) -> Vec<String> {
    let entries: Vec<String> = rank(resp)
        .into_iter()
        .filter_map(|r| render_entry(r, resp, bar_chart))
        .collect();

    paginate(&render_header(now), &entries, MESSAGE_BUDGET)
}
