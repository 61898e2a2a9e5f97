use std::cmp::Reverse;
use std::collections::HashMap;

use utils::text::chunk_lines;

use super::prelude::*;
use crate::helper::bson::update_indices;

mod blacklist;
mod clean;
pub mod config;
mod info;
mod model;

pub use config::Config;

/// Room left in a message for the role list header and code fences.
const ROLES_PER_MESSAGE_LEN: usize = 1900;

pub struct Module;

impl super::Module for Module {
    fn enabled(&self, config: &HBotConfig) -> bool {
        config.moderation.is_some()
    }

    fn intents(&self, _config: &HBotConfig) -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
    }

    fn commands(&self, _config: &HBotConfig) -> impl IntoIterator<Item = Command> {
        [
            command!("info", info::info, check = can_moderate),
            command!("history", info::history, check = can_moderate),
            command!("blacklist", blacklist::blacklist, check = can_moderate),
            command!("clean", clean::clean, check = can_moderate),
            command!("roles", roles, check = can_moderate),
        ]
    }

    fn validate(&self, config: &HBotConfig) -> Result {
        let moderation = config.moderation()?;
        anyhow::ensure!(
            config.mongodb_uri.is_some(),
            "moderation requires a `bot.mongodb_uri` for punishment records"
        );
        anyhow::ensure!(
            !moderation.roles.is_empty(),
            "`moderation.roles` must name at least one role"
        );
        anyhow::ensure!(
            moderation.clean_confirm_threshold > 0,
            "`moderation.clean_confirm_threshold` must be positive"
        );

        log::info!("Moderation is enabled.");
        Ok(())
    }

    async fn db_init(self, _data: Arc<HBotData>, db: mongodb::Database) -> Result {
        update_indices::<model::PunishmentRecord>(&db).await?;
        update_indices::<model::MessageRecord>(&db).await?;
        Ok(())
    }
}

/// Whether the invoker holds one of the moderator roles.
fn can_moderate(ctx: &CommandContext<'_>) -> bool {
    ctx.config()
        .moderation
        .as_ref()
        .is_some_and(|c| ctx.has_any_role(&c.roles))
}

/// Gets the position and name of every role in the guild from the cache.
fn guild_roles(
    ctx: &CommandContext<'_>,
    guild_id: GuildId,
) -> Result<HashMap<RoleId, (u16, String)>> {
    let guild = ctx
        .serenity
        .cache
        .guild(guild_id)
        .context("guild is not cached")?;

    Ok(guild
        .roles
        .iter()
        .map(|(id, role)| (*id, (role.position, role.name.clone())))
        .collect())
}

/// Gets the names of `ids`, highest role first. Unknown roles are skipped.
fn sorted_role_names(
    ctx: &CommandContext<'_>,
    guild_id: GuildId,
    ids: &[RoleId],
) -> Result<Vec<String>> {
    let mut known = guild_roles(ctx, guild_id)?;
    let mut roles: Vec<(u16, String)> = ids
        .iter()
        .filter(|id| **id != guild_id.everyone_role())
        .filter_map(|id| known.remove(id))
        .collect();

    roles.sort_by_key(|(position, _)| Reverse(*position));
    Ok(roles.into_iter().map(|(_, name)| name).collect())
}

async fn roles(ctx: CommandContext<'_>, _args: Args<'_>) -> Result {
    let guild_id = ctx.guild_id()?;
    let roles = guild_roles(&ctx, guild_id)?
        .into_iter()
        .map(|(id, (position, name))| (position, id, name))
        .collect();

    for content in role_messages(roles) {
        ctx.say(content).await?;
    }

    Ok(())
}

/// Lists roles as `name (id)` in code blocks, highest first.
fn role_messages(mut roles: Vec<(u16, RoleId, String)>) -> Vec<String> {
    roles.sort_by_key(|(position, id, _)| (Reverse(*position), *id));

    let lines: Vec<String> = roles
        .iter()
        .map(|(_, id, name)| format!("{name} ({id})"))
        .collect();

    chunk_lines(lines.iter().map(String::as_str), ROLES_PER_MESSAGE_LEN)
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let header = if index == 0 { "List of roles in guild:\n" } else { "" };
            format!("{header}```\n{chunk}\n```")
        })
        .collect()
}
