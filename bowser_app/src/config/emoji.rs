use std::fmt;
use std::num::NonZeroU64;

use serenity::model::channel::ReactionType;
use serenity::model::id::EmojiId;

use crate::helper::discord::emoji_equivalent;

/// Emoji loaded from the config.
///
/// Written either as the unicode character itself or as `name:id` for
/// custom guild emojis.
#[derive(Debug, Clone)]
pub struct HEmoji(ReactionType);

impl HEmoji {
    pub fn as_emoji(&self) -> &ReactionType {
        &self.0
    }

    pub fn equivalent_to(&self, other: &ReactionType) -> bool {
        emoji_equivalent(&self.0, other)
    }

    fn parse(s: &str) -> Result<Self, String> {
        let emoji = match s.split_once(':') {
            Some((name, id)) => {
                let id: NonZeroU64 = id
                    .parse()
                    .map_err(|_| format!("invalid custom emoji id in `{s}`"))?;

                ReactionType::Custom {
                    animated: false,
                    id: EmojiId::from(id),
                    name: Some(name.to_owned()),
                }
            },
            None if s.is_empty() => return Err("emoji must not be empty".to_owned()),
            None => ReactionType::Unicode(s.to_owned()),
        };

        Ok(Self(emoji))
    }
}

impl fmt::Display for HEmoji {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> serde::Deserialize<'de> for HEmoji {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
