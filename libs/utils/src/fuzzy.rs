//! Provides a collection that allows fuzzy title searching.
//!
//! Build a [`Search`] to be able to search for things by a text value, and
//! then [search](`Search::search`) it for [Matches](`Match`).
//!
//! # Match Score
//!
//! Texts are scored with a _partial ratio_, matching the scores of Python's
//! `fuzzywuzzy.fuzz.partial_ratio` on top of `difflib`:
//!
//! 1. The matching blocks of the shorter text within the longer text are
//!    found by repeatedly taking the longest common substring, then recursing
//!    to either side of it.
//! 2. For every block, the window of the longer text that aligns the block
//!    with the shorter text is compared to the shorter text. The similarity is
//!    `2 * matched / (len_a + len_b)`, where `matched` sums the sizes of the
//!    matching blocks of that comparison.
//! 3. The best similarity is scaled to `0..=100` and rounded half to even.
//!    Any similarity above `0.995` counts as `100`.
//!
//! Notably, the matching blocks are not the longest common subsequence, so
//! scores may be lower than an edit distance based metric would suggest.
//!
//! A score of `100` means the shorter text appears verbatim (after
//! normalization) somewhere in the longer text. It does _not_ mean the texts
//! are equal, so use [`Search::find_exact`] when exact matches should win.
//!
//! Matches with the same score are returned in insertion order.
//!
//! # Text Normalization
//!
//! The normalization lowercases the entire text and replaces every
//! character that is neither alphanumeric nor `_` with a space. Leading and trailing spaces are
//! removed.
//!
//! For instance, the following texts are equivalent after normalization:
//! - `"Hello World!"`
//! - `hello-world`
//! - `(hello world)`

use std::collections::HashMap;

use smallvec::SmallVec;

/// Normalized text. Most titles fit inline.
type NormText = SmallVec<[char; 48]>;

/// Provides a fuzzy text searcher.
///
/// [`Search::insert`] new elements with associated data, then
/// [`Search::search`] for the data by the key.
///
/// The `T` generic parameter defines the associated data to store.
#[derive(Debug, Clone)]
pub struct Search<T> {
    values: Vec<Entry<T>>,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    text: String,
    norm: NormText,
    userdata: T,
}

/// A single search result.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a, T> {
    /// The original text that was inserted.
    pub text: &'a str,
    /// The data associated with the text.
    pub data: &'a T,
    /// The partial ratio score, within `0..=100`.
    pub score: u8,
}

impl<T> Search<T> {
    /// Creates a new empty search instance.
    #[must_use]
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Gets the amount of inserted values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no values have been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Inserts a new value with associated data.
    pub fn insert(&mut self, text: &str, data: T) {
        self.values.push(Entry {
            text: text.to_owned(),
            norm: norm_str(text),
            userdata: data,
        });
    }

    /// Shrinks the internal storage to fit the inserted values.
    pub fn shrink_to_fit(&mut self) {
        self.values.shrink_to_fit();
    }

    /// Finds the first value whose original text equals `text`, ignoring case.
    ///
    /// No normalization beyond case folding is applied.
    #[must_use]
    pub fn find_exact(&self, text: &str) -> Option<Match<'_, T>> {
        let text = text.to_uppercase();
        self.values
            .iter()
            .find(|e| e.text.to_uppercase() == text)
            .map(|e| Match {
                text: &e.text,
                data: &e.userdata,
                score: 100,
            })
    }

    /// Searches for the best `limit` matches for `text`.
    ///
    /// The result is sorted by descending score. If `text` is empty after
    /// normalization, nothing matches.
    #[must_use]
    pub fn search(&self, text: &str, limit: usize) -> Vec<Match<'_, T>> {
        let query = norm_str(text);
        if query.is_empty() || limit == 0 {
            return Vec::new();
        }

        let mut matches: Vec<Match<'_, T>> = self
            .values
            .iter()
            .map(|e| Match {
                text: &e.text,
                data: &e.userdata,
                score: partial_ratio_norm(&query, &e.norm),
            })
            .collect();

        // stable, so equal scores keep insertion order
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches.truncate(limit);
        matches
    }
}

impl<T> Default for Search<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Calculates the partial ratio of two texts after normalizing them.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    partial_ratio_norm(&norm_str(a), &norm_str(b))
}

fn partial_ratio_norm(a: &[char], b: &[char]) -> u8 {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return 0;
    }

    let mut blocks = Matcher::new(short, long).matching_blocks();
    blocks.push(Block {
        a: short.len(),
        b: long.len(),
        size: 0,
    });

    let mut best = 0.0f64;
    for block in blocks {
        let start = block.b.saturating_sub(block.a);
        let end = (start + short.len()).min(long.len());
        let ratio = Matcher::new(short, &long[start..end]).ratio();
        if ratio > 0.995 {
            return 100;
        }

        best = best.max(ratio);
    }

    to_score(best)
}

/// A common run of `size` chars at `a` in the first and `b` in the second text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Block {
    a: usize,
    b: usize,
    size: usize,
}

/// Finds matching blocks between two texts, the same way as
/// `difflib.SequenceMatcher` without a junk filter.
struct Matcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of every char in `b`, ascending.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> Matcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        // popular chars of long texts don't seed matches
        if b.len() >= 200 {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Finds the longest common run within `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Of equally long runs, the one starting first in `a`, then in `b`, wins.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
        let (mut best_a, mut best_b, mut best_size) = (alo, blo, 0);

        // run length ending at each position of `b`, for the previous and current char of `a`
        let mut lens: HashMap<usize, usize> = HashMap::new();
        let mut next_lens: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            next_lens.clear();
            for &j in self.b2j.get(&self.a[i]).map_or(&[][..], Vec::as_slice) {
                if j < blo {
                    continue;
                }

                if j >= bhi {
                    break;
                }

                let k = j.checked_sub(1).and_then(|p| lens.get(&p)).map_or(1, |k| k + 1);
                next_lens.insert(j, k);
                if k > best_size {
                    best_a = i + 1 - k;
                    best_b = j + 1 - k;
                    best_size = k;
                }
            }

            std::mem::swap(&mut lens, &mut next_lens);
        }

        // popular chars were skipped above, so extend over them
        while best_a > alo && best_b > blo && self.a[best_a - 1] == self.b[best_b - 1] {
            best_a -= 1;
            best_b -= 1;
            best_size += 1;
        }

        while best_a + best_size < ahi
            && best_b + best_size < bhi
            && self.a[best_a + best_size] == self.b[best_b + best_size]
        {
            best_size += 1;
        }

        Block {
            a: best_a,
            b: best_b,
            size: best_size,
        }
    }

    /// Gets the matching blocks, ordered by position.
    fn matching_blocks(&self) -> Vec<Block> {
        let mut queue = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let block = self.longest_match(alo, ahi, blo, bhi);
            if block.size == 0 {
                continue;
            }

            if alo < block.a && blo < block.b {
                queue.push((alo, block.a, blo, block.b));
            }

            if block.a + block.size < ahi && block.b + block.size < bhi {
                queue.push((block.a + block.size, ahi, block.b + block.size, bhi));
            }

            blocks.push(block);
        }

        blocks.sort_unstable();
        blocks
    }

    /// The similarity of both texts, within `0.0..=1.0`.
    fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }

        let matched: usize = self.matching_blocks().iter().map(|b| b.size).sum();

        #[allow(clippy::cast_precision_loss, reason = "texts are short")]
        let ratio = (2 * matched) as f64 / total as f64;
        ratio
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_score(ratio: f64) -> u8 {
    (ratio * 100.0).round_ties_even().clamp(0.0, 100.0) as u8
}

fn norm_str(text: &str) -> NormText {
    let mut out = NormText::new();
    for c in text.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.extend(c.to_lowercase());
        } else {
            out.push(' ');
        }
    }

    let end = out.iter().rposition(|c| *c != ' ').map_or(0, |i| i + 1);
    out.truncate(end);
    let start = out.iter().position(|c| *c != ' ').unwrap_or(out.len());
    out.drain(..start);
    out
}

#[cfg(test)]
mod tests {
    use super::{Search, norm_str, partial_ratio};

    type TSearch = Search<u8>;

    fn titles() -> TSearch {
        let mut search = TSearch::new();
        search.insert("The Legend of Zelda: Breath of the Wild", 1);
        search.insert("Super Mario Odyssey", 2);
        search.insert("Mario Kart 8 Deluxe", 3);
        search.insert("Splatoon 2", 4);
        search.insert("Hollow Knight", 5);
        search
    }

    #[test]
    fn exact_ignores_case() {
        let search = titles();
        let found = search.find_exact("sPLATOON 2").expect("must find exact");
        assert_eq!(*found.data, 4);
        assert_eq!(found.text, "Splatoon 2");

        assert!(search.find_exact("Splatoon").is_none());
    }

    #[test]
    fn substring_scores_full() {
        assert_eq!(partial_ratio("zelda", "The Legend of Zelda: Breath of the Wild"), 100);
        assert_eq!(partial_ratio("Breath of the Wild", "breath-of-the-wild"), 100);
        assert_eq!(partial_ratio("", "anything"), 0);
    }

    #[test]
    fn typo_scores_high() {
        let score = partial_ratio("mario odysey", "Super Mario Odyssey");
        assert!(score > 85 && score < 100, "score was {score}");
    }

    #[test]
    fn scores_match_reference() {
        // values from `fuzzywuzzy.process.extract` with `fuzz.partial_ratio`
        let cases = [
            ("mario odysey", "Super Mario Odyssey", 92),
            ("holow night", "Hollow Knight", 82),
            ("zelda links awakening", "The Legend of Zelda: Link's Awakening", 90),
            ("celest", "Celeste", 100),
            ("smash bros", "Super Smash Bros. Ultimate", 100),
            ("pokemon sword", "Pokémon Shield", 62),
            ("metroid dread", "Metroid Prime Remastered", 77),
        ];

        for (query, title, expected) in cases {
            assert_eq!(partial_ratio(query, title), expected, "{query} vs {title}");
        }
    }

    #[test]
    fn unrelated_scores_low() {
        let score = partial_ratio("xqzjv", "Hollow Knight");
        assert!(score <= 40, "score was {score}");
    }

    #[test]
    fn search_order() {
        let search = titles();
        let found = search.search("mario", 3);
        let data: Vec<u8> = found.iter().map(|m| *m.data).collect();

        // both mario titles score 100 and keep insertion order
        assert_eq!(&data[..2], &[2, 3]);
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn search_empty_query() {
        let search = titles();
        assert!(search.search("!!!", 3).is_empty());
        assert!(search.search("mario", 0).is_empty());
    }

    #[test]
    fn norm_str_equality() {
        assert_eq!(norm_str("hello-world"), norm_str("Hello World!"));
        assert_eq!(norm_str("(hello world)"), norm_str("Hello World"));
        assert_eq!(norm_str(""), norm_str("----"));
    }
}
