//! Parser for structured level posts.
//!
//! A post is a block of `Key: value` lines in a fixed order, optionally
//! separated by blank lines:
//!
//! ```text
//! Name: Castle Rush
//! ID: 1AB-2CD-3EF
//! Style: SMB3
//! Theme: Castle
//! Tags: Speedrun
//! Difficulty: Hard
//! Description: Don't stop running.
//! ```
//!
//! `Theme` and `Tags` may be omitted and the ID key may also be spelled
//! `Level ID`. Keys are case-insensitive. Text before the `Name` line and
//! after the `Description` line is ignored.

/// The fields of a well-formed level post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelPost<'a> {
    pub name: &'a str,
    pub id: &'a str,
    pub style: &'a str,
    pub theme: Option<&'a str>,
    pub tags: Option<&'a str>,
    pub difficulty: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LevelPostError {
    #[error("no `Name:` line found")]
    NoName,
    #[error("expected `{0}:` line")]
    MissingField(&'static str),
    #[error("`{0}` must not be empty")]
    EmptyField(&'static str),
    #[error("level id is not in the format `XXX-XXX-XXX`")]
    InvalidId,
}

/// Whether `code` has the `XXX-XXX-XXX` level code shape.
pub fn is_level_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let valid = parts
        .by_ref()
        .take(3)
        .filter(|p| p.len() == 3 && p.bytes().all(|b| b.is_ascii_alphanumeric()))
        .count();

    valid == 3 && parts.next().is_none()
}

/// Parses a level post out of a message.
///
/// Every `Name:` line is tried as a start of the block. If none yields a
/// full post, the error of the first attempt is returned.
pub fn parse(content: &str) -> Result<LevelPost<'_>, LevelPostError> {
    let lines: Vec<&str> = content.lines().collect();
    let mut first_err = None;

    for start in 0..lines.len() {
        if field(lines[start], &["name"]).is_none() {
            continue;
        }

        match parse_at(&lines[start..]) {
            Ok(post) => return Ok(post),
            Err(err) => {
                first_err.get_or_insert(err);
            },
        }
    }

    Err(first_err.unwrap_or(LevelPostError::NoName))
}

fn parse_at<'a>(lines: &[&'a str]) -> Result<LevelPost<'a>, LevelPostError> {
    let mut lines = Lines { lines, pos: 0 };

    let name = lines.required("Name", &["name"])?;

    let id = lines.required("ID", &["id", "level id"])?;
    if !is_level_code(id) {
        return Err(LevelPostError::InvalidId);
    }

    let style = lines.required("Style", &["style"])?;
    let theme = lines.optional(&["theme"]);
    let tags = lines.optional(&["tags"]);
    let difficulty = lines.required("Difficulty", &["difficulty"])?;
    let description = lines.required("Description", &["description"])?;

    Ok(LevelPost {
        name,
        id,
        style,
        theme,
        tags,
        difficulty,
        description,
    })
}

struct Lines<'l, 'a> {
    lines: &'l [&'a str],
    pos: usize,
}

impl<'a> Lines<'_, 'a> {
    /// Gets the next non-blank line without consuming it.
    fn peek(&mut self) -> Option<&'a str> {
        while let Some(line) = self.lines.get(self.pos) {
            if !line.trim().is_empty() {
                return Some(line);
            }

            self.pos += 1;
        }

        None
    }

    fn optional(&mut self, keys: &[&str]) -> Option<&'a str> {
        let value = field(self.peek()?, keys)?;
        self.pos += 1;
        Some(value).filter(|v| !v.is_empty())
    }

    fn required(&mut self, name: &'static str, keys: &[&str]) -> Result<&'a str, LevelPostError> {
        let line = self.peek().ok_or(LevelPostError::MissingField(name))?;
        let value = field(line, keys).ok_or(LevelPostError::MissingField(name))?;
        if value.is_empty() {
            return Err(LevelPostError::EmptyField(name));
        }

        self.pos += 1;
        Ok(value)
    }
}

/// Gets the trimmed value of a `Key: value` line if the key is one of `keys`.
fn field<'a>(line: &'a str, keys: &[&str]) -> Option<&'a str> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    keys.iter()
        .any(|k| k.eq_ignore_ascii_case(key))
        .then(|| value.trim())
}

#[cfg(test)]
mod tests {
    use super::{LevelPost, LevelPostError, is_level_code, parse};

    #[test]
    fn level_code_shape() {
        assert!(is_level_code("1AB-2cd-3EF"));
        assert!(!is_level_code("1AB-2CD"));
        assert!(!is_level_code("1AB-2CD-3EF-4GH"));
        assert!(!is_level_code("1AB-2C_-3EF"));
        assert!(!is_level_code("1ABC-2CD-3EF"));
    }

    #[test]
    fn full_post() {
        let post = parse(
            "Name: Castle Rush\nID: 1AB-2CD-3EF\nStyle: SMB3\nTheme: Castle\nTags: Speedrun\n\
             Difficulty: Hard\nDescription: Don't stop running.",
        )
        .expect("post is valid");

        assert_eq!(
            post,
            LevelPost {
                name: "Castle Rush",
                id: "1AB-2CD-3EF",
                style: "SMB3",
                theme: Some("Castle"),
                tags: Some("Speedrun"),
                difficulty: "Hard",
                description: "Don't stop running.",
            }
        );
    }

    #[test]
    fn optional_fields_and_blank_lines() {
        let post = parse(
            "my new level!\n\nname: Sky High\n\nLevel ID:   XY1-ZZ2-AB3  \n\nstyle: SMW\n\n\
             difficulty: Expert\n\ndescription: Jumps.\nthanks for playing",
        )
        .expect("post is valid");

        assert_eq!(post.name, "Sky High");
        assert_eq!(post.id, "XY1-ZZ2-AB3");
        assert_eq!(post.theme, None);
        assert_eq!(post.tags, None);
        assert_eq!(post.description, "Jumps.");
    }

    #[test]
    fn malformed_posts() {
        assert_eq!(parse("check out 1AB-2CD-3EF"), Err(LevelPostError::NoName));
        assert_eq!(
            parse("Name: A\nID: 1AB-2CD-3EF\nDifficulty: Easy\nDescription: x"),
            Err(LevelPostError::MissingField("Style"))
        );
        assert_eq!(
            parse("Name: A\nID: 1AB2CD3EF\nStyle: SMB\nDifficulty: Easy\nDescription: x"),
            Err(LevelPostError::InvalidId)
        );
        assert_eq!(
            parse("Name: A\nID: 1AB-2CD-3EF\nStyle: SMB\nDifficulty: Easy\nDescription:"),
            Err(LevelPostError::EmptyField("Description"))
        );
    }

    #[test]
    fn later_block_wins() {
        let post = parse(
            "Name: draft\n\nName: Final\nID: 1AB-2CD-3EF\nStyle: SMB\nDifficulty: Easy\n\
             Description: done",
        )
        .expect("second block is valid");

        assert_eq!(post.name, "Final");
    }
}
