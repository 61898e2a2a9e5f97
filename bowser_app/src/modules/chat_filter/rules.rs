//! The message rules, evaluated without touching Discord.

use regex::Regex;

use super::config::Config;
use super::level_post::{self, LevelPost, LevelPostError};
use crate::prelude::*;

const MERCHANTS: &str = "amazon|bhphotovideo|bestbuy|ebay|gamestop|groupon|newegg(?:business)?|stacksocial|target|tigerdirect|walmart";

/// Compiled patterns used by the filter.
#[derive(Debug)]
pub struct Rules {
    affiliate: Regex,
    link: Regex,
    level_code: Regex,
}

/// What to do about the level code rules for a message.
#[derive(Debug, PartialEq, Eq)]
pub enum LevelAction<'a> {
    /// Nothing applies.
    Ignore,
    /// Level codes don't belong here. Delete and point to the target channel.
    Redirect { target: ChannelId },
    /// A well-formed post to replace with an embed.
    Post(LevelPost<'a>),
    /// A malformed post to delete, echoing the content back.
    Malformed(LevelPostError),
}

/// A Discord-side step for a message, in execution order.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a> {
    /// Repost with merchant queries stripped. This deletes the original.
    Repost(Cow<'a, str>),
    /// Delete the original message.
    Delete,
    /// Send an expiring notice pointing to `target`.
    RedirectNotice { target: ChannelId },
    /// Send an expiring notice echoing the malformed post.
    FormatNotice(LevelPostError),
    /// Send the level embed, then delete the original if asked to.
    ///
    /// The original stays up when the embed can't be sent.
    Embed {
        post: LevelPost<'a>,
        delete_original: bool,
    },
}

impl Rules {
    pub fn new() -> Result<Self> {
        let affiliate = format!(
            r"(?i)(https?://(?:[^\s/?]*\.)?(?:{MERCHANTS})\.[a-z.]{{2,7}}/[^\s?]*)\?[^\s>)]+"
        );

        Ok(Self {
            affiliate: Regex::new(&affiliate).context("invalid affiliate pattern")?,
            link: Regex::new(r"https?://(?:[a-zA-Z0-9$-_@.&+!*(),]|%[0-9a-fA-F]{2})+")
                .context("invalid link pattern")?,
            level_code: Regex::new(r"(?i)[0-9a-z]{3}-[0-9a-z]{3}-[0-9a-z]{3}")
                .context("invalid level code pattern")?,
        })
    }

    /// Removes the query strings from merchant links.
    ///
    /// Returns [`None`] if there were no such links.
    pub fn strip_affiliate<'a>(&self, content: &'a str) -> Option<Cow<'a, str>> {
        if !self.affiliate.is_match(content) {
            return None;
        }

        Some(self.affiliate.replace_all(content, "$1"))
    }

    pub fn has_level_code(&self, content: &str) -> bool {
        self.level_code.is_match(content)
    }

    pub fn has_link(&self, content: &str) -> bool {
        self.link.is_match(content)
    }

    /// Lists the steps to take for a message in `channel`.
    ///
    /// Every rule applies independently, but the original message is deleted
    /// at most once.
    pub fn plan<'a>(&self, config: &Config, channel: ChannelId, content: &'a str) -> Vec<Step<'a>> {
        let mut steps = Vec::new();
        let mut deleted = false;

        if config.strip_affiliate_links
            && let Some(stripped) = self.strip_affiliate(content)
        {
            steps.push(Step::Repost(stripped));
            deleted = true;
        }

        match self.level_action(config, channel, content) {
            LevelAction::Ignore => {},
            LevelAction::Redirect { target } => {
                if !deleted {
                    steps.push(Step::Delete);
                }

                steps.push(Step::RedirectNotice { target });
            },
            LevelAction::Malformed(why) => {
                steps.push(Step::FormatNotice(why));
                if !deleted {
                    steps.push(Step::Delete);
                }
            },
            LevelAction::Post(post) => steps.push(Step::Embed {
                post,
                delete_original: !deleted,
            }),
        }

        steps
    }

    /// Decides how the level code rules apply to a message in `channel`.
    pub fn level_action<'a>(
        &self,
        config: &Config,
        channel: ChannelId,
        content: &'a str,
    ) -> LevelAction<'a> {
        if let Some(redirect) = &config.level_redirect
            && redirect.channel == channel
        {
            // a level code inside a link is most likely part of the url
            return if self.has_level_code(content) && !self.has_link(content) {
                LevelAction::Redirect {
                    target: redirect.target,
                }
            } else {
                LevelAction::Ignore
            };
        }

        if config.level_posts == Some(channel) && self.has_level_code(content) {
            return match level_post::parse(content) {
                Ok(post) => LevelAction::Post(post),
                Err(why) => LevelAction::Malformed(why),
            };
        }

        LevelAction::Ignore
    }
}

#[cfg(test)]
mod tests {
    use serenity::model::id::ChannelId;

    use super::super::config::{Config, LevelRedirect};
    use super::{LevelAction, LevelPostError, Rules, Step};

    const CHAT: u64 = 100;
    const LEVELS: u64 = 200;

    fn config() -> Config {
        Config {
            strip_affiliate_links: true,
            level_redirect: Some(LevelRedirect {
                channel: ChannelId::new(CHAT),
                target: ChannelId::new(LEVELS),
            }),
            level_posts: Some(ChannelId::new(LEVELS)),
            redirect_lifetime: std::time::Duration::from_secs(20),
            format_error_lifetime: std::time::Duration::from_secs(25),
        }
    }

    fn rules() -> Rules {
        Rules::new().expect("patterns are valid")
    }

    #[test]
    fn strips_merchant_queries() {
        let rules = rules();
        let stripped = rules
            .strip_affiliate("deal: https://www.amazon.com/dp/B01N?tag=aff-20 go go")
            .expect("link is filtered");
        assert_eq!(stripped, "deal: https://www.amazon.com/dp/B01N go go");

        let stripped = rules
            .strip_affiliate("https://smile.amazon.co.uk/x?a=1 and https://www.bestbuy.com/p?ref=2")
            .expect("links are filtered");
        assert_eq!(stripped, "https://smile.amazon.co.uk/x and https://www.bestbuy.com/p");
    }

    #[test]
    fn leaves_other_links() {
        let rules = rules();
        assert!(rules.strip_affiliate("https://www.amazon.com/dp/B01N").is_none());
        assert!(rules.strip_affiliate("https://example.com/x?tag=1").is_none());
        assert!(rules.strip_affiliate("no links here").is_none());
    }

    #[test]
    fn redirect_without_link() {
        let rules = rules();
        let config = config();
        let chat = ChannelId::new(CHAT);

        assert_eq!(
            rules.level_action(&config, chat, "play my level 1AB-2CD-3EF"),
            LevelAction::Redirect {
                target: ChannelId::new(LEVELS)
            }
        );
        assert_eq!(
            rules.level_action(&config, chat, "1AB-2CD-3EF https://example.com/"),
            LevelAction::Ignore
        );
        assert_eq!(
            rules.level_action(&config, chat, "just chatting"),
            LevelAction::Ignore
        );
    }

    #[test]
    fn level_posts_channel() {
        let rules = rules();
        let config = config();
        let levels = ChannelId::new(LEVELS);

        assert_eq!(
            rules.level_action(&config, levels, "discussion without codes"),
            LevelAction::Ignore
        );
        assert!(matches!(
            rules.level_action(&config, levels, "try 1AB-2CD-3EF"),
            LevelAction::Malformed(_)
        ));

        let post = "Name: A\nID: 1AB-2CD-3EF\nStyle: SMB\nDifficulty: Easy\nDescription: x";
        assert!(matches!(
            rules.level_action(&config, levels, post),
            LevelAction::Post(p) if p.id == "1AB-2CD-3EF"
        ));
    }

    #[test]
    fn other_channels_ignored() {
        let rules = rules();
        assert_eq!(
            rules.level_action(&config(), ChannelId::new(300), "1AB-2CD-3EF"),
            LevelAction::Ignore
        );
    }

    #[test]
    fn keeps_closing_brackets() {
        let rules = rules();
        let stripped = rules
            .strip_affiliate("<https://www.amazon.com/dp/X?tag=y> (https://www.ebay.com/itm/1?hash=z)")
            .expect("links are filtered");
        assert_eq!(stripped, "<https://www.amazon.com/dp/X> (https://www.ebay.com/itm/1)");
    }

    #[test]
    fn plan_redirect() {
        let steps = rules().plan(&config(), ChannelId::new(CHAT), "play my level 1AB-2CD-3EF");
        assert_eq!(steps, [
            Step::Delete,
            Step::RedirectNotice {
                target: ChannelId::new(LEVELS)
            },
        ]);
    }

    #[test]
    fn plan_repost_deletes_once() {
        // redirects never apply to messages with links
        let content = "1AB-2CD-3EF https://www.amazon.com/dp/B01N?tag=aff-20";
        let steps = rules().plan(&config(), ChannelId::new(LEVELS), content);

        assert_eq!(steps, [
            Step::Repost("1AB-2CD-3EF https://www.amazon.com/dp/B01N".into()),
            Step::FormatNotice(LevelPostError::NoName),
        ]);
        assert!(!steps.contains(&Step::Delete), "original is already gone");
    }

    #[test]
    fn plan_malformed() {
        let steps = rules().plan(&config(), ChannelId::new(LEVELS), "try 1AB-2CD-3EF");
        assert_eq!(steps, [Step::FormatNotice(LevelPostError::NoName), Step::Delete]);
    }

    #[test]
    fn plan_post_after_repost_keeps_original() {
        let post = "Name: A\nID: 1AB-2CD-3EF\nStyle: SMB\nDifficulty: Easy\n\
                    Description: https://www.amazon.com/dp/B01N?tag=aff-20";

        let steps = rules().plan(&config(), ChannelId::new(LEVELS), post);
        assert_eq!(steps.len(), 2, "repost and embed: {steps:?}");
        assert!(matches!(steps[0], Step::Repost(_)));
        assert!(matches!(
            &steps[1],
            Step::Embed { post, delete_original: false } if post.name == "A"
        ));

        let plain = "Name: A\nID: 1AB-2CD-3EF\nStyle: SMB\nDifficulty: Easy\nDescription: x";
        let steps = rules().plan(&config(), ChannelId::new(LEVELS), plain);
        assert!(matches!(
            steps.as_slice(),
            [Step::Embed { delete_original: true, .. }]
        ));
    }

    #[test]
    fn plan_without_affiliate_filter() {
        let mut config = config();
        config.strip_affiliate_links = false;

        let steps = rules().plan(&config, ChannelId::new(300), "https://www.amazon.com/dp/B01N?tag=aff-20");
        assert!(steps.is_empty(), "nothing applies: {steps:?}");
    }
}
