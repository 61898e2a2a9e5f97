//! The `clean` command, deleting and archiving recent messages.

use std::time::Duration;

use serenity::builder::GetMessages;

use super::config::Config;
use super::model::{ArchiveRecord, ArchivedMessage};
use crate::data::LOG_EMBED_COLOR;
use crate::fmt::discord::get_unique_username;
use crate::helper::bson::ModelCollection;
use crate::helper::discord::delete_after;
use crate::helper::time::now_unix;
use crate::modules::prelude::*;

/// Messages older than this cannot be bulk deleted. Slightly under 14 days.
const BULK_MAX_AGE: i64 = 14 * 24 * 60 * 60 - 60;

/// Discord's limit on fetched and bulk deleted messages per request.
const PAGE_SIZE: u8 = 100;

const DONE_LIFETIME: Duration = Duration::from_secs(5);

pub async fn clean(ctx: CommandContext<'_>, mut args: Args<'_>) -> Result {
    let config = ctx.config().moderation()?;
    let count: u32 = args.integer("messages")?;
    let members = args.users_greedy();

    if count == 0 {
        return Err(HArgError::new_const("Must clean at least one message.").into());
    }

    if count >= config.clean_confirm_threshold && !confirm(ctx, config, count).await? {
        return Ok(());
    }

    let channel_id = ctx.msg.channel_id;
    ctx.msg
        .delete(ctx.serenity)
        .await
        .context("failed to delete invocation")?;

    let mut deleted = fetch_targets(ctx, count, &members).await?;
    let (bulk, single) = split_by_age(deleted.iter().map(|m| m.id), now_unix());

    for chunk in bulk.chunks(PAGE_SIZE.into()) {
        let res = match chunk {
            [id] => channel_id.delete_message(ctx.http(), *id).await,
            _ => channel_id.delete_messages(ctx.http(), chunk).await,
        };

        res.context("failed to delete messages")?;
    }

    for id in single {
        channel_id
            .delete_message(ctx.http(), id)
            .await
            .context("failed to delete old message")?;
    }

    let emoji = &ctx.config().emojis.green_tick;
    let done = ctx.say(format!("{emoji} Clean action complete")).await?;
    delete_after(Arc::clone(ctx.http()), &done, DONE_LIFETIME);

    if deleted.is_empty() {
        return Ok(());
    }

    // fetched newest first
    deleted.reverse();
    let archive = ArchiveRecord {
        channel: channel_id,
        moderator: ctx.author().id,
        timestamp: now_unix(),
        messages: deleted.iter().map(archived).collect(),
    };

    let result = ArchiveRecord::collection(ctx.data.database()?)
        .insert_one(&archive)
        .await
        .context("cannot store message archive")?;

    let archive_id = match result.inserted_id.as_object_id() {
        Some(id) => id.to_hex(),
        None => result.inserted_id.to_string(),
    };

    let embed = CreateEmbed::new()
        .description(format!("Archive URL: {}", config.archive_url(&archive_id)))
        .color(LOG_EMBED_COLOR)
        .timestamp(Timestamp::now());
    let log = CreateMessage::new()
        .content(format!(
            ":printer: New message archive generated for {}",
            channel_id.mention()
        ))
        .embed(embed);

    if let Err(why) = config.server_log.send_message(ctx.http(), log).await {
        log::error!("Failed to log archive {archive_id}: {why:?}");
    }

    Ok(())
}

/// Asks the invoker to confirm a large clean with reactions.
async fn confirm(ctx: CommandContext<'_>, config: &Config, count: u32) -> Result<bool> {
    let emojis = &ctx.config().emojis;
    let mut prompt = ctx
        .say(format!(
            "This action will delete up to {count}, are you sure you want to proceed?"
        ))
        .await?;

    let green = emojis.green_tick.clone();
    let red = emojis.red_tick.clone();
    prompt.react(ctx.http(), green.as_emoji().clone()).await?;
    prompt.react(ctx.http(), red.as_emoji().clone()).await?;

    let reaction = prompt
        .await_reaction(ctx.serenity)
        .author_id(ctx.author().id)
        .timeout(config.confirm_timeout)
        .filter({
            let green = green.clone();
            move |r| green.equivalent_to(&r.emoji) || red.equivalent_to(&r.emoji)
        })
        .await;

    let cancel_text = match reaction {
        Some(r) if green.equivalent_to(&r.emoji) => {
            prompt
                .delete(ctx.serenity)
                .await
                .context("failed to delete confirmation")?;
            return Ok(true);
        },
        Some(_) => "Clean action canceled.",
        None => "Confirmation timed out, clean action canceled.",
    };

    prompt
        .edit(ctx.serenity, EditMessage::new().content(cancel_text))
        .await
        .context("failed to edit confirmation")?;
    prompt
        .delete_reactions(ctx.serenity)
        .await
        .context("failed to clear confirmation reactions")?;
    Ok(false)
}

/// Fetches the last `count` messages before the invocation and keeps those
/// by `members`, or all if none are given. Newest first.
async fn fetch_targets(
    ctx: CommandContext<'_>,
    count: u32,
    members: &[UserId],
) -> Result<Vec<Message>> {
    let channel_id = ctx.msg.channel_id;
    let mut before = ctx.msg.id;
    let mut remaining = count;
    let mut targets = Vec::new();

    while remaining > 0 {
        let limit = u8::try_from(remaining).unwrap_or(PAGE_SIZE).min(PAGE_SIZE);
        let page = channel_id
            .messages(ctx.http(), GetMessages::new().before(before).limit(limit))
            .await
            .context("failed to fetch messages")?;

        let Some(last) = page.last() else {
            break;
        };

        before = last.id;
        remaining = remaining.saturating_sub(u32::from(limit));
        let fetched = page.len();

        targets.extend(
            page.into_iter()
                .filter(|m| members.is_empty() || members.contains(&m.author.id)),
        );

        if fetched < usize::from(limit) {
            break;
        }
    }

    Ok(targets)
}

/// Splits ids into those that can be bulk deleted and those that are too old.
fn split_by_age(
    ids: impl IntoIterator<Item = MessageId>,
    now: i64,
) -> (Vec<MessageId>, Vec<MessageId>) {
    ids.into_iter()
        .partition(|id| now - id.created_at().unix_timestamp() < BULK_MAX_AGE)
}

fn archived(msg: &Message) -> ArchivedMessage {
    ArchivedMessage {
        id: msg.id,
        author: msg.author.id,
        author_name: get_unique_username(&msg.author).into_owned(),
        content: msg.content.clone(),
        timestamp: msg.timestamp.unix_timestamp(),
        attachments: msg.attachments.iter().map(|a| a.url.clone()).collect(),
    }
}
