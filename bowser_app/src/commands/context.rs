use serenity::prelude::*;

use crate::config::HBotConfig;
use crate::prelude::*;

/// Everything a command needs about its invocation.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    pub serenity: &'a Context,
    pub data: &'a Arc<HBotData>,
    pub msg: &'a Message,
    /// The prefix the command was invoked with.
    pub prefix: &'a str,
}

impl<'a> CommandContext<'a> {
    pub fn config(&self) -> &'a HBotConfig {
        self.data.config()
    }

    pub fn http(&self) -> &'a Arc<serenity::http::Http> {
        &self.serenity.http
    }

    pub fn author(&self) -> &'a User {
        &self.msg.author
    }

    /// The guild the command was invoked in.
    ///
    /// Commands are only dispatched for guild messages.
    pub fn guild_id(&self) -> Result<GuildId> {
        self.msg.guild_id.context("command must be used in a guild")
    }

    /// Whether the invoking member has any of the roles.
    pub fn has_any_role(&self, roles: &[RoleId]) -> bool {
        self.msg
            .member
            .as_ref()
            .is_some_and(|m| m.roles.iter().any(|r| roles.contains(r)))
    }

    /// Sends a plain message to the invocation channel.
    pub async fn say(&self, content: impl Into<String>) -> Result<Message> {
        let msg = self
            .msg
            .channel_id
            .say(self.http(), content)
            .await
            .context("failed to send reply")?;
        Ok(msg)
    }

    /// Sends a message to the invocation channel.
    pub async fn send(&self, message: CreateMessage) -> Result<Message> {
        let msg = self
            .msg
            .channel_id
            .send_message(self.http(), message)
            .await
            .context("failed to send reply")?;
        Ok(msg)
    }

    /// Replies with the red tick and a message.
    pub async fn error(&self, content: impl std::fmt::Display) -> Result {
        let emoji = &self.config().emojis.red_tick;
        self.say(format!("{emoji} {content}")).await?;
        Ok(())
    }
}
