use serenity::futures::future::BoxFuture;
use utils::text::truncate;

use super::prelude::*;
use crate::fmt::discord::{code_block, get_unique_username};
use crate::helper::discord::{display_name, is_user_message, say_expiring};
use crate::helper::events::MessageHandler;

pub mod config;
mod level_post;
mod rules;

pub use config::Config;
use level_post::LevelPost;
use rules::{Rules, Step};

const LEVEL_EMBED_COLOR: Colour = Colour::new(0x66_00_FF);

/// Keeps the echoed content and notice text within a message.
const ECHO_LEN: usize = 1700;

pub struct Module;

impl super::Module for Module {
    fn enabled(&self, config: &HBotConfig) -> bool {
        config.chat_filter.is_some()
    }

    fn intents(&self, _config: &HBotConfig) -> GatewayIntents {
        GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }

    fn validate(&self, config: &HBotConfig) -> Result {
        let filter = config.chat_filter()?;
        if let Some(redirect) = &filter.level_redirect {
            anyhow::ensure!(
                Some(redirect.channel) != filter.level_posts,
                "`chat_filter.level_redirect.channel` cannot be the level posts channel"
            );
        }

        log::info!("Chat filter is enabled.");
        Ok(())
    }

    fn message_handler(self) -> Result<Option<Box<dyn MessageHandler>>> {
        let handler = ChatFilter {
            rules: Rules::new()?,
        };

        Ok(Some(Box::new(handler)))
    }
}

struct ChatFilter {
    rules: Rules,
}

impl MessageHandler for ChatFilter {
    fn name(&self) -> &'static str {
        "chat filter"
    }

    fn message<'a>(
        &'a self,
        ctx: &'a Context,
        data: &'a Arc<HBotData>,
        msg: &'a Message,
    ) -> BoxFuture<'a, Result> {
        Box::pin(self.filter(ctx, data, msg))
    }
}

impl ChatFilter {
    async fn filter(&self, ctx: &Context, data: &HBotData, msg: &Message) -> Result {
        if msg.guild_id.is_none() || !is_user_message(msg) {
            return Ok(());
        }

        let config = data.config().chat_filter()?;
        for step in self.rules.plan(config, msg.channel_id, &msg.content) {
            match step {
                Step::Repost(content) => repost(ctx, msg, &content).await?,
                Step::Delete => {
                    msg.delete(ctx).await.context("failed to delete filtered message")?;
                },
                Step::RedirectNotice { target } => {
                    let content = format!(
                        "{} {} Please do not post Super Mario Maker 2 level codes here. \
                         Post in {} with the pinned template instead.",
                        data.config().emojis.red_tick,
                        msg.author.mention(),
                        target.mention(),
                    );

                    let notice = CreateMessage::new().content(content);
                    say_expiring(&ctx.http, msg.channel_id, notice, config.redirect_lifetime)
                        .await;
                },
                Step::FormatNotice(why) => {
                    log::debug!("Malformed level post {}: {why}", msg.link());

                    let content = format!(
                        "{} {} Your level is formatted incorrectly, please see the pinned \
                         messages for the format. A copy of your message is included and will \
                         be deleted shortly. You can resubmit your level at any time.\n\n{}",
                        data.config().emojis.red_tick,
                        msg.author.mention(),
                        code_block(&truncate(&msg.content, ECHO_LEN)),
                    );

                    let notice = CreateMessage::new().content(content);
                    say_expiring(&ctx.http, msg.channel_id, notice, config.format_error_lifetime)
                        .await;
                },
                Step::Embed {
                    post,
                    delete_original,
                } => {
                    let embed = CreateMessage::new().embed(level_embed(msg, &post));
                    match msg.channel_id.send_message(ctx, embed).await {
                        Ok(_) if delete_original => {
                            msg.delete(ctx).await.context("failed to delete level post")?;
                        },
                        Ok(_) => {},
                        // the original text stays up instead
                        Err(why) => {
                            log::error!(
                                "Unable to send level embed to {}: {why:?}",
                                msg.channel_id
                            );
                        },
                    }
                },
            }
        }

        Ok(())
    }
}

/// Deletes the message and sends `content` in its place through a webhook
/// that looks like the author.
async fn repost(ctx: &Context, msg: &Message, content: &str) -> Result {
    let channel_id = msg.channel_id;
    let hooks = channel_id
        .webhooks(ctx)
        .await
        .context("failed to get channel webhooks")?;

    let hook = match hooks.into_iter().find(|h| h.token.is_some()) {
        Some(hook) => hook,
        None => {
            let name = format!("mab_{channel_id}");
            let create = CreateWebhook::new(name)
                .audit_log_reason("No webhooks existed; 1<= required for chat filtering");

            channel_id
                .create_webhook(ctx, create)
                .await
                .context("failed to create filter webhook")?
        },
    };

    msg.delete(ctx).await.context("failed to delete filtered message")?;

    let execute = ExecuteWebhook::new()
        .content(content)
        .username(display_name(msg))
        .avatar_url(msg.author.face())
        .allowed_mentions(CreateAllowedMentions::new().all_users(true));

    hook.execute(ctx, false, execute)
        .await
        .context("failed to repost filtered message")?;
    Ok(())
}

fn level_embed(msg: &Message, post: &LevelPost<'_>) -> CreateEmbed {
    let author = CreateEmbedAuthor::new(get_unique_username(&msg.author))
        .icon_url(msg.author.face());

    let mut embed = CreateEmbed::new()
        .color(LEVEL_EMBED_COLOR)
        .author(author)
        .field("Name", post.name, true)
        .field("Level ID", post.id, true)
        .field("Description", post.description, false)
        .field("Style", post.style, true)
        .field("Difficulty", post.difficulty, true);

    if let Some(theme) = post.theme {
        embed = embed.field("Theme", theme, false);
    }

    if let Some(tags) = post.tags {
        embed = embed.field("Tags", tags, false);
    }

    embed
}
