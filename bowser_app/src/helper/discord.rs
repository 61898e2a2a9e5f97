use std::time::Duration;

use serenity::http::Http;

use crate::prelude::*;

/// Compares emojis by id for custom ones and by character for unicode ones.
pub fn emoji_equivalent(a: &ReactionType, b: &ReactionType) -> bool {
    use ReactionType as R;

    match (a, b) {
        (R::Custom { id: a_id, .. }, R::Custom { id: b_id, .. }) => a_id == b_id,
        (R::Unicode(a_name), R::Unicode(b_name)) => a_name == b_name,
        _ => false,
    }
}

/// Whether the message is a normal message sent by a human.
pub fn is_user_message(msg: &Message) -> bool {
    !msg.author.bot && matches!(msg.kind, MessageType::Regular | MessageType::InlineReply)
}

/// Gets the name the author is shown with in the guild.
pub fn display_name(msg: &Message) -> &str {
    msg.member
        .as_ref()
        .and_then(|m| m.nick.as_deref())
        .or(msg.author.global_name.as_deref())
        .unwrap_or(&msg.author.name)
}

/// Sends a message and deletes it again after `lifetime`.
///
/// Failures are logged and otherwise ignored.
pub async fn say_expiring(
    http: &Arc<Http>,
    channel_id: ChannelId,
    message: CreateMessage,
    lifetime: Duration,
) {
    let sent = match channel_id.send_message(http, message).await {
        Ok(sent) => sent,
        Err(why) => {
            log::warn!("Failed to send notice to {channel_id}: {why:?}");
            return;
        },
    };

    delete_after(Arc::clone(http), &sent, lifetime);
}

/// Deletes a sent message after `delay` in the background.
pub fn delete_after(http: Arc<Http>, msg: &Message, delay: Duration) {
    let (channel_id, message_id) = (msg.channel_id, msg.id);
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(why) = channel_id.delete_message(&http, message_id).await {
            log::debug!("Expired message {message_id} was not deleted: {why:?}");
        }
    });
}

#[cfg(test)]
mod tests {
    use serenity::model::channel::ReactionType;
    use serenity::model::id::EmojiId;

    use super::emoji_equivalent;

    #[test]
    fn custom_emoji_by_id() {
        let a = ReactionType::Custom {
            animated: false,
            id: EmojiId::new(1234),
            name: Some("greenTick".to_owned()),
        };
        let b = ReactionType::Custom {
            animated: true,
            id: EmojiId::new(1234),
            name: None,
        };

        assert!(emoji_equivalent(&a, &b));
        assert!(!emoji_equivalent(&a, &ReactionType::Unicode("✅".to_owned())));
    }
}
