//! A small prefix command framework.
//!
//! Commands are matched by name, which may consist of several words, such as
//! `games search`. The longest matching name wins.

use serenity::futures::future::BoxFuture;
use serenity::prelude::*;

use crate::helper::discord::is_user_message;
use crate::helper::events::MessageHandler;
use crate::prelude::*;

mod args;
mod context;

pub use args::Args;
pub use context::CommandContext;

/// The function invoked to run a command.
pub type CommandFn = for<'a> fn(CommandContext<'a>, Args<'a>) -> BoxFuture<'a, Result>;

/// A check run before the command. Failed checks silently ignore the
/// invocation.
pub type CheckFn = fn(&CommandContext<'_>) -> bool;

/// A registered text command.
#[derive(Clone, Copy)]
pub struct Command {
    pub name: &'static str,
    pub run: CommandFn,
    pub check: CheckFn,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Declares a [`Command`] from an `async fn(CommandContext<'_>, Args<'_>)`.
///
/// ```ignore
/// command!("games search", search, check = can_search)
/// ```
macro_rules! command {
    ($name:literal, $func:path) => {
        $crate::commands::command!($name, $func, check = $crate::commands::allow_all)
    };
    ($name:literal, $func:path, check = $check:path) => {{
        fn run<'a>(
            ctx: $crate::commands::CommandContext<'a>,
            args: $crate::commands::Args<'a>,
        ) -> ::serenity::futures::future::BoxFuture<'a, $crate::prelude::Result> {
            ::std::boxed::Box::pin($func(ctx, args))
        }

        $crate::commands::Command {
            name: $name,
            run,
            check: $check,
        }
    }};
}

pub(crate) use command;

/// A check that passes for everyone.
pub fn allow_all(_ctx: &CommandContext<'_>) -> bool {
    true
}

/// Dispatches prefixed messages to commands.
pub struct CommandHandler {
    prefix: String,
    commands: Vec<Command>,
}

impl CommandHandler {
    pub fn new(prefix: String, mut commands: Vec<Command>) -> Result<Self> {
        anyhow::ensure!(!prefix.is_empty(), "command prefix must not be empty");

        // longest names first so `games search` is tried before `games`
        commands.sort_by_key(|c| std::cmp::Reverse(c.name.split_whitespace().count()));

        for (index, command) in commands.iter().enumerate() {
            anyhow::ensure!(
                commands[..index].iter().all(|c| c.name != command.name),
                "duplicate command `{}`",
                command.name
            );
        }

        Ok(Self { prefix, commands })
    }

    /// Finds the command invoked by `content`, returning it with the
    /// remaining argument text.
    fn find<'c>(&self, content: &'c str) -> Option<(&Command, &'c str)> {
        let content = content.strip_prefix(&self.prefix)?;
        self.commands
            .iter()
            .find_map(|c| strip_name(content, c.name).map(|rest| (c, rest)))
    }

    async fn handle(&self, ctx: &Context, data: &Arc<HBotData>, msg: &Message) -> Result {
        if !is_user_message(msg) || msg.guild_id.is_none() {
            return Ok(());
        }

        let Some((command, rest)) = self.find(&msg.content) else {
            return Ok(());
        };

        let cmd_ctx = CommandContext {
            serenity: ctx,
            data,
            msg,
            prefix: &self.prefix,
        };

        if !(command.check)(&cmd_ctx) {
            log::debug!("{} may not use `{}`.", msg.author.name, command.name);
            return Ok(());
        }

        log::info!("{} invoked `{}`.", msg.author.name, command.name);
        match (command.run)(cmd_ctx, Args::new(rest)).await {
            Ok(()) => Ok(()),
            Err(why) => match why.downcast_ref::<HArgError>() {
                Some(arg) => cmd_ctx.error(&arg.msg).await,
                None => {
                    log::error!("Command `{}` failed: {why:?}", command.name);
                    cmd_ctx
                        .error("Something went wrong while running that command.")
                        .await
                },
            },
        }
    }
}

impl MessageHandler for CommandHandler {
    fn name(&self) -> &'static str {
        "commands"
    }

    fn message<'a>(
        &'a self,
        ctx: &'a Context,
        data: &'a Arc<HBotData>,
        msg: &'a Message,
    ) -> BoxFuture<'a, Result> {
        Box::pin(self.handle(ctx, data, msg))
    }
}

/// Strips every word of `name` off the front of `content`.
///
/// Each word must be followed by whitespace or the end of the text.
fn strip_name<'c>(content: &'c str, name: &str) -> Option<&'c str> {
    let mut rest = content;
    for (index, word) in name.split_whitespace().enumerate() {
        if index != 0 {
            let trimmed = rest.trim_start();
            if trimmed.len() == rest.len() {
                return None;
            }
            rest = trimmed;
        }

        rest = rest.strip_prefix(word)?;
        if rest.chars().next().is_some_and(|c| !c.is_whitespace()) {
            return None;
        }
    }

    Some(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn noop(_ctx: CommandContext<'_>, _args: Args<'_>) -> Result {
        Ok(())
    }

    fn handler() -> CommandHandler {
        CommandHandler::new(
            "!".to_owned(),
            vec![
                command!("ping", noop),
                command!("games", noop),
                command!("games search", noop),
            ],
        )
        .expect("valid commands")
    }

    #[test]
    fn strip_single_word() {
        assert_eq!(strip_name("ping", "ping"), Some(""));
        assert_eq!(strip_name("ping now", "ping"), Some(" now"));
        assert_eq!(strip_name("pingpong", "ping"), None);
        assert_eq!(strip_name("pin", "ping"), None);
    }

    #[test]
    fn strip_multi_word() {
        assert_eq!(strip_name("games  search zelda", "games search"), Some(" zelda"));
        assert_eq!(strip_name("gamessearch zelda", "games search"), None);
        assert_eq!(strip_name("games zelda", "games search"), None);
    }

    #[test]
    fn find_prefers_longest_name() {
        let handler = handler();

        let (command, rest) = handler.find("!games search mario kart").expect("must match");
        assert_eq!(command.name, "games search");
        assert_eq!(Args::new(rest).rest(), "mario kart");

        let (command, _) = handler.find("!games").expect("must match");
        assert_eq!(command.name, "games");

        assert!(handler.find("ping").is_none());
        assert!(handler.find("!pong").is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let res = CommandHandler::new(
            "!".to_owned(),
            vec![command!("ping", noop), command!("ping", noop)],
        );
        assert!(res.is_err());
    }
}
