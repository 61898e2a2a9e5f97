//! Provides helper methods to work with displayed text.

use std::borrow::Cow;
use std::fmt::Arguments;

const ELLIPSIS: char = '\u{2026}';

/// Truncates a string to the given `len` (in terms of [`char`], not [`u8`]).
/// If a truncation happens, appends an ellipsis.
///
/// # Panics
///
/// Panics if `len` is zero. `len` must be at least 1.
///
/// # Examples
///
/// ```
/// # use std::borrow::Cow;
/// # use utils::text::truncate;
/// let text = "hello world";
/// assert!(matches!(truncate(text, 11), Cow::Borrowed(_)));
/// assert_eq!(truncate(text, 6), "hello…");
/// ```
pub fn truncate(str: &str, len: usize) -> Cow<'_, str> {
    assert!(len != 0, "cannot truncate to a length of 0");

    match str.char_indices().nth(len - 1) {
        // the char at `len - 1` exists, check there is anything after it
        Some((index, c)) if str.len() > index + c.len_utf8() => {
            let mut out = String::with_capacity(index + ELLIPSIS.len_utf8());
            out.push_str(&str[..index]);
            out.push(ELLIPSIS);
            Cow::Owned(out)
        },
        _ => Cow::Borrowed(str),
    }
}

/// Packs lines into chunks of at most `max_len` characters each.
///
/// Lines are kept whole and joined with `\n`. A single line longer than
/// `max_len` is truncated to fit.
///
/// # Panics
///
/// Panics if `max_len` is zero.
pub fn chunk_lines<'a, I>(lines: I, max_len: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut chunk_len = 0usize;

    for line in lines {
        let line = truncate(line, max_len);
        let line_len = line.chars().count();

        // +1 for the joining newline
        if !chunk.is_empty() && chunk_len + 1 + line_len > max_len {
            chunks.push(std::mem::take(&mut chunk));
            chunk_len = 0;
        }

        if !chunk.is_empty() {
            chunk.push('\n');
            chunk_len += 1;
        }

        chunk.push_str(&line);
        chunk_len += line_len;
    }

    if !chunk.is_empty() {
        chunks.push(chunk);
    }

    chunks
}

/// Lets [`write!`] target a [`String`] without a [`Result`] to discard.
///
/// Formatting into a [`String`] only fails if a [`Display`](std::fmt::Display)
/// impl reports an error on its own, which is a bug in that impl.
pub trait WriteStr {
    /// Called by [`write!`]. Not meant to be used directly.
    fn write_fmt(&mut self, args: Arguments<'_>);
}

impl WriteStr for String {
    fn write_fmt(&mut self, args: Arguments<'_>) {
        let res = std::fmt::Write::write_fmt(self, args);
        debug_assert!(res.is_ok(), "a Display impl returned an error");
    }
}

#[cfg(test)]
mod tests {
    use super::{WriteStr as _, chunk_lines, truncate};

    #[test]
    fn truncate_multibyte() {
        assert_eq!(truncate("🇺🇸🇪🇺", 4), "🇺🇸🇪🇺");
        assert_eq!(truncate("ääää", 3), "ää…");
        assert_eq!(truncate("a", 1), "a");
    }

    #[test]
    fn chunk_lines_fits() {
        let chunks = chunk_lines(["aaaa", "bbbb", "cccc"], 9);
        assert_eq!(chunks, ["aaaa\nbbbb", "cccc"]);

        let chunks = chunk_lines(["aaaaaaaaaaaa"], 5);
        assert_eq!(chunks, ["aaaa…"]);

        assert!(chunk_lines([], 5).is_empty());
    }

    #[test]
    fn write_str_to_string() {
        let mut out = String::new();
        write!(out, "{}-{}", 1, "two");
        assert_eq!(out, "1-two");
    }
}
