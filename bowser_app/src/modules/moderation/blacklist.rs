//! The `blacklist` command, toggling a channel's blacklist role.

use bson::doc;

use super::model::{PunishmentRecord, PunishmentType};
use crate::data::LOG_EMBED_COLOR;
use crate::fmt::discord::get_unique_username;
use crate::helper::bson::{ModelCollection, id_bson};
use crate::helper::time::now_unix;
use crate::modules::prelude::*;

const DEFAULT_REASON: &str = "-No reason specified-";

pub async fn blacklist(ctx: CommandContext<'_>, mut args: Args<'_>) -> Result {
    let config = ctx.config().moderation()?;
    let member_id = args.user("member")?;
    let channel_id = args.channel("channel")?;
    let reason = match args.rest() {
        "" => DEFAULT_REASON,
        reason => reason,
    };

    let Some(role_id) = config.blacklist_role(channel_id) else {
        return Err(HArgError::new_const("You cannot blacklist a user from that channel").into());
    };

    let guild_id = ctx.guild_id()?;
    let member = guild_id
        .member(ctx.serenity, member_id)
        .await
        .map_err(|_| HArgError::new_const("That user is not a member of this server."))?;

    let channel_name = match channel_id.name(ctx.serenity).await {
        Ok(name) => name,
        Err(why) => {
            log::warn!("Could not get name of channel {channel_id}: {why:?}");
            channel_id.to_string()
        },
    };

    let kind = if member.roles.contains(&role_id) {
        member
            .remove_role(ctx.http(), role_id)
            .await
            .context("failed to remove blacklist role")?;
        PunishmentType::Unblacklist
    } else {
        member
            .add_role(ctx.http(), role_id)
            .await
            .context("failed to add blacklist role")?;
        PunishmentType::Blacklist
    };

    record(ctx, member_id, kind, reason, &channel_name).await?;

    let status = kind.name();
    let verb = status.to_lowercase();
    let username = get_unique_username(&member.user);

    let embed = CreateEmbed::new()
        .color(LOG_EMBED_COLOR)
        .timestamp(Timestamp::now())
        .author(CreateEmbedAuthor::new(format!("{status}ed | {username}")))
        .field("User", member_id.mention().to_string(), true)
        .field("Moderator", ctx.author().mention().to_string(), true)
        .field("Channel", channel_id.mention().to_string(), true)
        .field("Reason", reason, true);

    if let Err(why) = config
        .mod_log
        .send_message(ctx.http(), CreateMessage::new().embed(embed))
        .await
    {
        log::error!("Failed to log {verb} of {member_id}: {why:?}");
    }

    let guild_name = guild_id
        .name(&ctx.serenity.cache)
        .unwrap_or_else(|| "the server".to_owned());
    let dm = dm_text(
        &verb,
        &channel_id.mention().to_string(),
        &guild_name,
        &get_unique_username(ctx.author()),
        reason,
    );

    // members may have DMs closed
    if let Err(why) = member
        .user
        .direct_message(ctx.serenity, CreateMessage::new().content(dm))
        .await
    {
        log::debug!("Could not DM {member_id} about their {verb}: {why:?}");
    }

    if config.quiet_channels.contains(&ctx.msg.channel_id) {
        ctx.msg
            .delete(ctx.serenity)
            .await
            .context("failed to delete invocation")?;
    } else {
        let emoji = &ctx.config().emojis.green_tick;
        ctx.say(format!(
            "{emoji} {username} has been {verb}ed from {}",
            channel_id.mention()
        ))
        .await?;
    }

    Ok(())
}

/// Stores the action, deactivating the current blacklist when it is lifted.
async fn record(
    ctx: CommandContext<'_>,
    user: UserId,
    kind: PunishmentType,
    reason: &str,
    channel_name: &str,
) -> Result {
    let puns = PunishmentRecord::collection(ctx.data.database()?);

    if kind == PunishmentType::Unblacklist {
        puns.update_one(
            doc! {
                "user": id_bson(user),
                "type": "blacklist",
                "active": true,
                "context": channel_name,
            },
            doc! { "$set": { "active": false } },
        )
        .await
        .context("cannot deactivate blacklist")?;
    }

    let record = PunishmentRecord {
        id: None,
        user,
        moderator: ctx.author().id,
        kind,
        reason: reason.to_owned(),
        timestamp: now_unix(),
        active: kind == PunishmentType::Blacklist,
        context: Some(channel_name.to_owned()),
    };

    puns.insert_one(&record)
        .await
        .context("cannot store punishment")?;
    Ok(())
}

fn dm_text(verb: &str, channel: &str, guild: &str, moderator: &str, reason: &str) -> String {
    format!(
        "You have been {verb}ed from {channel} in **{guild}** by {moderator}. \
         Reason:\n> {reason}"
    )
}

#[cfg(test)]
mod tests {
    use super::dm_text;
    use crate::modules::moderation::model::PunishmentType;

    #[test]
    fn dm_wording() {
        let verb = PunishmentType::Unblacklist.name().to_lowercase();
        assert_eq!(
            dm_text(&verb, "<#1>", "Nintendo Homebrew", "mod", "appealed"),
            "You have been unblacklisted from <#1> in **Nintendo Homebrew** by mod. Reason:\n> appealed"
        );
    }
}
