use std::time::Duration;

use serde_with::serde_as;

use crate::helper::time::Dhms;
use crate::prelude::*;

const fn default_clean_confirm_threshold() -> u32 {
    100
}

const fn default_confirm_timeout() -> Duration {
    Duration::from_secs(15)
}

#[serde_as]
#[derive(Debug, serde::Deserialize)]
pub struct Config {
    /// Members with any of these roles may use the moderation commands.
    pub roles: Vec<RoleId>,
    pub mod_log: ChannelId,
    pub server_log: ChannelId,
    /// Base of the message archive links, without a trailing slash.
    pub archive_base_url: String,
    #[serde(default)]
    pub blacklist: Vec<BlacklistChannel>,
    /// Moderation commands used here are deleted instead of confirmed.
    #[serde(default)]
    pub quiet_channels: Vec<ChannelId>,

    /// `clean` asks for confirmation when deleting at least this many.
    #[serde(default = "default_clean_confirm_threshold")]
    pub clean_confirm_threshold: u32,
    #[serde_as(as = "Dhms")]
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout: Duration,
}

/// A channel members can be blacklisted from by giving them a role.
#[derive(Debug, serde::Deserialize)]
pub struct BlacklistChannel {
    pub channel: ChannelId,
    pub role: RoleId,
}

impl Config {
    pub fn blacklist_role(&self, channel: ChannelId) -> Option<RoleId> {
        self.blacklist
            .iter()
            .find(|b| b.channel == channel)
            .map(|b| b.role)
    }

    pub fn archive_url(&self, id: &impl std::fmt::Display) -> String {
        format!("{}/archive/{id}", self.archive_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serenity::model::id::{ChannelId, RoleId};

    use super::Config;

    #[test]
    fn parse_blacklist() {
        let config: Config = toml::from_str(
            r#"
            roles = ["238081280632160257"]
            mod_log = "238081135865757696"
            server_log = "238081135865757697"
            archive_base_url = "https://archive.example.com/"

            [[blacklist]]
            channel = "238081556260708352"
            role = "337702187138646016"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.clean_confirm_threshold, 100);
        assert_eq!(config.confirm_timeout, Duration::from_secs(15));
        assert!(config.quiet_channels.is_empty());

        assert_eq!(
            config.blacklist_role(ChannelId::new(238_081_556_260_708_352)),
            Some(RoleId::new(337_702_187_138_646_016))
        );
        assert_eq!(config.blacklist_role(ChannelId::new(1)), None);
        assert_eq!(
            config.archive_url(&"abc"),
            "https://archive.example.com/archive/abc"
        );
    }
}
