use std::borrow::Cow;
use std::fmt::{Display, Result, Write};

pub mod discord;

/// If non-empty, turns the string into a [`Cow::Owned`].
///
/// Otherwise returns a [`Cow::Borrowed`] with the `default`.
pub fn written_or(string: String, default: &str) -> Cow<'_, str> {
    if string.is_empty() {
        Cow::Borrowed(default)
    } else {
        Cow::Owned(string)
    }
}

/// Writes every item of `iter`, separated by `join`.
pub fn write_join<W, I>(mut f: W, iter: I, join: &str) -> Result
where
    W: Write,
    I: IntoIterator,
    I::Item: Display,
{
    let mut iter = iter.into_iter();
    if let Some(item) = iter.next() {
        write!(f, "{item}")?;
        for item in iter {
            f.write_str(join)?;
            write!(f, "{item}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{write_join, written_or};

    #[test]
    fn join_items() {
        let mut out = String::new();
        write_join(&mut out, ["Admin", "Mod", "Member"], ", ").expect("string write");
        assert_eq!(out, "Admin, Mod, Member");

        let mut out = String::new();
        write_join(&mut out, Vec::<&str>::new(), ", ").expect("string write");
        assert_eq!(written_or(out, "*none*"), "*none*");
    }
}
