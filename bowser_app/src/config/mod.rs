use serde::Deserialize;
use serenity::model::Colour;

mod emoji;
pub mod setup;

pub use emoji::HEmoji;

#[derive(Debug, Deserialize)]
pub struct HConfig {
    pub discord: HDiscordConfig,
    pub bot: HBotConfig,
    #[serde(default)]
    pub log: log4rs::config::RawConfig,
}

#[derive(Debug, Deserialize)]
pub struct HDiscordConfig {
    pub token: String,
    pub status: Option<String>,
}

fn default_prefix() -> String {
    "!".to_owned()
}

const fn default_embed_color() -> Colour {
    Colour::new(0x18_EE_1C)
}

#[derive(Debug, Deserialize)]
pub struct HBotConfig {
    /// Prefix for text commands.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_embed_color")]
    pub embed_color: Colour,
    pub mongodb_uri: Option<String>,
    pub emojis: HEmojiConfig,
    pub deals: Option<crate::modules::deals::Config>,
    pub chat_filter: Option<crate::modules::chat_filter::Config>,
    pub moderation: Option<crate::modules::moderation::Config>,
}

/// Emojis used across messages and reactions.
#[derive(Debug, Deserialize)]
pub struct HEmojiConfig {
    pub green_tick: HEmoji,
    pub red_tick: HEmoji,
    pub bar_chart: HEmoji,
}

impl HBotConfig {
    pub fn deals(&self) -> anyhow::Result<&crate::modules::deals::Config> {
        use anyhow::Context as _;
        self.deals.as_ref().context("deals must be enabled")
    }

    pub fn chat_filter(&self) -> anyhow::Result<&crate::modules::chat_filter::Config> {
        use anyhow::Context as _;
        self.chat_filter
            .as_ref()
            .context("chat_filter must be enabled")
    }

    pub fn moderation(&self) -> anyhow::Result<&crate::modules::moderation::Config> {
        use anyhow::Context as _;
        self.moderation
            .as_ref()
            .context("moderation must be enabled")
    }
}
