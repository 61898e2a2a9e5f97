use super::prelude::*;

pub struct Module;

impl super::Module for Module {
    fn enabled(&self, _config: &HBotConfig) -> bool {
        true
    }

    fn intents(&self, _config: &HBotConfig) -> GatewayIntents {
        GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
    }

    fn commands(&self, _config: &HBotConfig) -> impl IntoIterator<Item = Command> {
        [command!("ping", ping)]
    }
}

/// Discord's epoch, 2015-01-01, in unix milliseconds.
const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Gets the creation time of a snowflake in unix milliseconds.
fn snowflake_millis(id: MessageId) -> u64 {
    (id.get() >> 22) + DISCORD_EPOCH_MS
}

/// Formats milliseconds as seconds with 3 decimals.
fn format_seconds(millis: u64) -> String {
    format!("{}.{:03}", millis / 1000, millis % 1000)
}

async fn ping(ctx: CommandContext<'_>, _args: Args<'_>) -> Result {
    let mut reply = ctx.say("Evaluating...").await?;

    let elapsed = snowflake_millis(reply.id).saturating_sub(snowflake_millis(ctx.msg.id));
    let content = format!("Pong! Roundtrip latency {} seconds", format_seconds(elapsed));

    reply
        .edit(ctx.http(), EditMessage::new().content(content))
        .await
        .context("failed to edit ping reply")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use serenity::model::id::MessageId;

    use super::{format_seconds, snowflake_millis};

    #[test]
    fn snowflake_time() {
        // example snowflake from the Discord docs
        let id = MessageId::new(175_928_847_299_117_063);
        assert_eq!(snowflake_millis(id), 1_462_015_105_796);
    }

    #[test]
    fn seconds_format() {
        assert_eq!(format_seconds(0), "0.000");
        assert_eq!(format_seconds(1234), "1.234");
        assert_eq!(format_seconds(57), "0.057");
    }
}
