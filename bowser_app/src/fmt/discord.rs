//! Formatting for Discord data.

use crate::prelude::*;

/// Gets a unique username for this user.
///
/// This is either the pomelo username or the legacy `name#0000` tag.
#[must_use]
pub fn get_unique_username(user: &User) -> Cow<'_, str> {
    user.discriminator
        .map(|d| format!("{}#{:04}", user.name, d).into())
        .unwrap_or_else(|| user.name.as_str().into())
}

/// Wraps user text in a code block so it is shown verbatim.
///
/// Backtick runs are broken up with zero-width spaces so the text cannot close
/// the block early.
#[must_use]
pub fn code_block(text: &str) -> String {
    let text = text.replace("```", "`\u{200b}`\u{200b}`");
    format!("```{text}```")
}

#[cfg(test)]
mod tests {
    use super::code_block;

    #[test]
    fn code_block_escapes_fences() {
        assert_eq!(code_block("hello"), "```hello```");
        assert_eq!(code_block("a```b"), "```a`\u{200b}`\u{200b}`b```");
    }
}
