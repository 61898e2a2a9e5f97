use std::time::Duration;

use serde_with::serde_as;

use crate::helper::time::Dhms;
use crate::prelude::*;

const fn default_redirect_lifetime() -> Duration {
    Duration::from_secs(20)
}

const fn default_format_error_lifetime() -> Duration {
    Duration::from_secs(25)
}

#[serde_as]
#[derive(Debug, serde::Deserialize)]
pub struct Config {
    /// Repost messages with merchant links without their query strings.
    #[serde(default = "default_true")]
    pub strip_affiliate_links: bool,
    /// A channel where level codes are not allowed.
    pub level_redirect: Option<LevelRedirect>,
    /// The channel for structured level posts.
    pub level_posts: Option<ChannelId>,

    #[serde_as(as = "Dhms")]
    #[serde(default = "default_redirect_lifetime")]
    pub redirect_lifetime: Duration,
    #[serde_as(as = "Dhms")]
    #[serde(default = "default_format_error_lifetime")]
    pub format_error_lifetime: Duration,
}

#[derive(Debug, serde::Deserialize)]
pub struct LevelRedirect {
    pub channel: ChannelId,
    /// The channel users are pointed to instead.
    pub target: ChannelId,
}

const fn default_true() -> bool {
    true
}
