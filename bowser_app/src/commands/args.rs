//! Parsing of text command arguments.

use std::str::FromStr;

use serenity::utils::{parse_channel_mention, parse_user_mention};

use crate::prelude::*;

/// The unparsed remainder of a command invocation.
///
/// Arguments are separated by whitespace and consumed front to back.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: text.trim_start(),
        }
    }

    /// Whether all arguments have been consumed.
    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn peek_word(&self) -> Option<(&'a str, &'a str)> {
        if self.rest.is_empty() {
            return None;
        }

        let end = self
            .rest
            .find(char::is_whitespace)
            .unwrap_or(self.rest.len());
        let (word, rest) = self.rest.split_at(end);
        Some((word, rest.trim_start()))
    }

    /// Takes the next whitespace-separated word.
    pub fn next_word(&mut self) -> Option<&'a str> {
        let (word, rest) = self.peek_word()?;
        self.rest = rest;
        Some(word)
    }

    /// Takes all remaining text, trimmed.
    pub fn rest(self) -> &'a str {
        self.rest.trim_end()
    }

    fn required(&mut self, name: &str) -> Result<&'a str, HArgError> {
        self.next_word()
            .ok_or_else(|| HArgError::new(format!("Missing argument `{name}`.")))
    }

    /// Takes an integer argument.
    pub fn integer<T: FromStr>(&mut self, name: &str) -> Result<T, HArgError> {
        let word = self.required(name)?;
        word.parse()
            .map_err(|_| HArgError::new(format!("`{word}` is not a valid number for `{name}`.")))
    }

    /// Takes a user given as a mention or raw id.
    pub fn user(&mut self, name: &str) -> Result<UserId, HArgError> {
        let word = self.required(name)?;
        parse_user(word)
            .ok_or_else(|| HArgError::new(format!("`{word}` is not a valid user for `{name}`.")))
    }

    /// Takes a channel given as a mention or raw id.
    pub fn channel(&mut self, name: &str) -> Result<ChannelId, HArgError> {
        let word = self.required(name)?;
        parse_channel(word).ok_or_else(|| {
            HArgError::new(format!("`{word}` is not a valid channel for `{name}`."))
        })
    }

    /// Takes as many users as possible, stopping at the first word that isn't
    /// one. May return an empty list.
    pub fn users_greedy(&mut self) -> Vec<UserId> {
        let mut users = Vec::new();
        while let Some((word, rest)) = self.peek_word()
            && let Some(user) = parse_user(word)
        {
            users.push(user);
            self.rest = rest;
        }

        users
    }
}

fn parse_id(text: &str) -> Option<u64> {
    let id: u64 = text.parse().ok()?;
    (id != 0 && id != u64::MAX).then_some(id)
}

/// Parses `<@id>`, `<@!id>` or a plain id.
pub fn parse_user(text: &str) -> Option<UserId> {
    parse_user_mention(text)
        .map(UserId::get)
        .or_else(|| parse_id(text))
        .filter(|id| *id != u64::MAX)
        .map(UserId::new)
}

/// Parses `<#id>` or a plain id.
pub fn parse_channel(text: &str) -> Option<ChannelId> {
    parse_channel_mention(text)
        .map(ChannelId::get)
        .or_else(|| parse_id(text))
        .filter(|id| *id != u64::MAX)
        .map(ChannelId::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_and_rest() {
        let mut args = Args::new("  first second   third fourth ");
        assert_eq!(args.next_word(), Some("first"));
        assert_eq!(args.next_word(), Some("second"));
        assert_eq!(args.rest(), "third fourth");
    }

    #[test]
    fn empty_args() {
        let mut args = Args::new("   ");
        assert!(args.is_empty());
        assert_eq!(args.next_word(), None);
        assert!(args.integer::<u32>("messages").is_err());
    }

    #[test]
    fn user_forms() {
        let id = UserId::new(123_456_789);
        assert_eq!(parse_user("<@123456789>"), Some(id));
        assert_eq!(parse_user("<@!123456789>"), Some(id));
        assert_eq!(parse_user("123456789"), Some(id));
        assert_eq!(parse_user("<#123456789>"), None);
        assert_eq!(parse_user("<@0>"), None);
        assert_eq!(parse_user("someone"), None);
        assert_eq!(parse_user("<@12ab>"), None);
        assert_eq!(parse_user("18446744073709551615"), None);
    }

    #[test]
    fn channel_forms() {
        let id = ChannelId::new(42);
        assert_eq!(parse_channel("<#42>"), Some(id));
        assert_eq!(parse_channel("42"), Some(id));
        assert_eq!(parse_channel("<@42>"), None);
        assert_eq!(parse_channel("<#0>"), None);
    }

    #[test]
    fn greedy_users_stop_at_text() {
        let mut args = Args::new("<@1> <@!2> 3 because spam");
        let users = args.users_greedy();
        assert_eq!(users, [UserId::new(1), UserId::new(2), UserId::new(3)]);
        assert_eq!(args.rest(), "because spam");

        let mut args = Args::new("not a user");
        assert!(args.users_greedy().is_empty());
        assert_eq!(args.rest(), "not a user");
    }

    #[test]
    fn integer_errors_name_argument() {
        let mut args = Args::new("many");
        let err = args.integer::<u32>("messages").expect_err("must fail");
        assert!(err.msg.contains("messages"));
    }
}
