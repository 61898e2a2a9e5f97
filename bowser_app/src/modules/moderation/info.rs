//! The `info` and `history` commands.

use bson::doc;
use serenity::futures::TryStreamExt as _;
use utils::text::WriteStr as _;

use super::model::{MessageRecord, PunishmentRecord, UserRecord};
use super::{guild_roles, sorted_role_names};
use crate::fmt::discord::get_unique_username;
use crate::fmt::{write_join, written_or};
use crate::helper::bson::{ModelCollection, id_bson};
use crate::helper::time::{LONG_FORMAT, NUMERIC_FORMAT, SHORT_FORMAT, format_unix};
use crate::modules::prelude::*;

/// Newest punishments shown by `info`.
const INFO_PUNISHMENTS: i64 = 5;

/// Discord's limit of fields per embed.
const FIELDS_PER_EMBED: usize = 25;

fn author(user: &User) -> CreateEmbedAuthor {
    CreateEmbedAuthor::new(format!("{} | {}", get_unique_username(user), user.id)).icon_url(user.face())
}

async fn fetch_user(ctx: &CommandContext<'_>, user_id: UserId) -> Result<User> {
    user_id
        .to_user(ctx.serenity)
        .await
        .map_err(|_| HArgError::new_const("User does not exist").into())
}

pub async fn info(ctx: CommandContext<'_>, mut args: Args<'_>) -> Result {
    let user_id = args.user("user")?;
    let guild_id = ctx.guild_id()?;
    let db = ctx.data.database()?;

    let member = guild_id.member(ctx.serenity, user_id).await.ok();
    let user = match &member {
        Some(member) => member.user.clone(),
        None => fetch_user(&ctx, user_id).await?,
    };

    let stored = UserRecord::collection(db)
        .find_one(doc! { "_id": id_bson(user_id) })
        .await
        .context("cannot load user record")?;

    let created = format_unix(user.id.created_at().unix_timestamp(), LONG_FORMAT);
    let color = ctx.config().embed_color;

    let roles = match (&member, &stored) {
        (Some(member), _) => Some(sorted_role_names(&ctx, guild_id, &member.roles)?),
        (None, Some(stored)) => {
            let known = guild_roles(&ctx, guild_id)?;
            let names = stored
                .roles
                .iter()
                .rev()
                .map(|id| match known.get(id) {
                    Some((_, name)) => name.clone(),
                    None => "*deleted role*".to_owned(),
                })
                .collect();
            Some(names)
        },
        (None, None) => None,
    };

    let Some(roles) = roles else {
        let embed = CreateEmbed::new()
            .color(color)
            .description(format!(
                "Fetched information about {} from the API because they are not in this \
                 server. There is little information to display as such",
                user.mention()
            ))
            .author(author(&user))
            .thumbnail(user.face())
            .field("Created", created, false);

        ctx.send(CreateMessage::new().embed(embed)).await?;
        return Ok(());
    };

    let messages = MessageRecord::collection(db);
    let message_count = messages
        .count_documents(doc! { "author": id_bson(user_id) })
        .await
        .context("cannot count messages")?;
    let last_message = messages
        .find_one(doc! { "author": id_bson(user_id) })
        .sort(doc! { "timestamp": -1 })
        .await
        .context("cannot load last message")?;

    let puns = PunishmentRecord::collection(db);
    let pun_total = puns
        .count_documents(doc! { "user": id_bson(user_id) })
        .await
        .context("cannot count punishments")?;
    let recent: Vec<PunishmentRecord> = puns
        .find(doc! { "user": id_bson(user_id) })
        .sort(doc! { "timestamp": -1 })
        .limit(INFO_PUNISHMENTS)
        .await?
        .try_collect()
        .await
        .context("cannot load punishments")?;

    let desc = if member.is_some() {
        format!("Fetched user {}", user.mention())
    } else {
        format!(
            "Fetched information about previous member {} from the API because they are not \
             in this server. Showing last know data from before they left.",
            user.mention()
        )
    };

    let mut embed = CreateEmbed::new()
        .color(color)
        .description(desc)
        .author(author(&user))
        .thumbnail(user.face())
        .field("Messages", message_count.to_string(), true);

    if let Some(joined_at) = member.as_ref().and_then(|m| m.joined_at) {
        embed = embed.field("Join date", format_unix(joined_at.unix_timestamp(), LONG_FORMAT), true);
    }

    let last_message = last_message.map_or_else(
        || "N/a".to_owned(),
        |m| format_unix(m.timestamp, LONG_FORMAT),
    );

    let summary = punishment_summary(
        &recent,
        pun_total,
        ctx.prefix,
        &get_unique_username(&user),
        user.id,
    );
    let embed = embed
        .field("Roles", role_list(&roles), false)
        .field("Last message", last_message, true)
        .field("Created", created, true)
        .field("Punishments", summary, false);

    ctx.send(CreateMessage::new().embed(embed)).await?;
    Ok(())
}

pub async fn history(ctx: CommandContext<'_>, mut args: Args<'_>) -> Result {
    let user_id = args.user("user")?;
    let db = ctx.data.database()?;
    let user = fetch_user(&ctx, user_id).await?;

    let records: Vec<PunishmentRecord> = PunishmentRecord::collection(db)
        .find(doc! { "user": id_bson(user_id) })
        .sort(doc! { "timestamp": -1 })
        .await?
        .try_collect()
        .await
        .context("cannot load punishments")?;

    if records.is_empty() {
        return Err(HArgError::new_const("User has no punishments on record").into());
    }

    let color = ctx.config().embed_color;
    let fields = history_fields(&records);
    for (index, page) in fields.chunks(FIELDS_PER_EMBED).enumerate() {
        let mut embed = CreateEmbed::new().color(color).fields(
            page.iter()
                .map(|(name, value)| (name.as_str(), value.as_str(), true)),
        );

        if index == 0 {
            embed = embed
                .title("Infraction History")
                .description(history_description(records.len()))
                .author(author(&user));
        }

        ctx.send(CreateMessage::new().embed(embed)).await?;
    }

    Ok(())
}

fn role_list(names: &[String]) -> Cow<'static, str> {
    let mut out = String::new();
    _ = write_join(&mut out, names, ", ");
    written_or(out, "*User has no roles*")
}

/// Renders the newest punishments as a diff block, `-` for reversals.
fn punishment_summary(
    recent: &[PunishmentRecord],
    total: u64,
    prefix: &str,
    tag: &str,
    user_id: UserId,
) -> String {
    if recent.is_empty() {
        return "__*No punishments on record*__".to_owned();
    }

    let mut out = format!(
        "Showing {}/{total} punishment entries. For a full history including responsible \
         moderator, active status, and more use `{prefix}history @{tag}` or \
         `{prefix}history {user_id}`\n```diff\n",
        recent.len()
    );

    for record in recent {
        let sign = if record.kind.is_reversal() { '-' } else { '+' };
        let stamp = format_unix(record.timestamp, NUMERIC_FORMAT);
        writeln!(out, "{sign} [{stamp}] {}", record.kind.name());
    }

    out.push_str("```");
    out
}

fn history_description(count: usize) -> String {
    if count == 1 {
        "There is __1__ infraction record for this user:".to_owned()
    } else {
        format!("There are __{count}__ infraction records for this user:")
    }
}

/// One `(name, value)` embed field per record.
fn history_fields(records: &[PunishmentRecord]) -> Vec<(String, String)> {
    records
        .iter()
        .map(|r| {
            let name = format_unix(r.timestamp, SHORT_FORMAT);
            let value = format!(
                "**Moderator:** <@{}>\n**Details:** [{}] {}",
                r.moderator,
                r.display_kind(),
                r.reason
            );
            (name, value)
        })
        .collect()
}
