mod commands;
mod config;
mod data;
mod fmt;
mod helper;
mod logging;
mod modules;
mod prelude;

/// The cargo package version.
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> anyhow::Result<()> {
    use std::panic;

    use serenity::gateway::ActivityData;
    use serenity::prelude::*;

    use crate::config::HConfig;
    use crate::data::HInit;
    use crate::helper::events::HEventHandler;
    use crate::prelude::*;

    return inner();

    // short async fn to reduce `tokio::main` scope
    #[tokio::main]
    async fn inner() -> anyhow::Result<()> {
        // run the program and clean up
        let res = run().await;
        if let Err(why) = &res {
            log::error!("Exiting due to error: {why:?}");
        }

        log::logger().flush();
        res
    }

    // actual main logic
    async fn run() -> Result {
        let HConfig {
            discord,
            bot,
            log: log_config,
        } = build_config()?;
        init_logging(log_config)?;

        // register the custom panic handler after logging is set up
        panic::set_hook(Box::new(on_panic));

        log::info!(target: "bowser_app::version", "Bowser v{VERSION}");

        let bot_data = Arc::new(HBotData::new(bot));
        let HInit {
            intents,
            event_handlers,
        } = bot_data.init()?;

        let event_handler = HEventHandler::new(Arc::clone(&bot_data), event_handlers);

        let startup = Arc::clone(&bot_data).startup();
        let discord = async move {
            let status = discord
                .status
                .unwrap_or_else(|| format!("v{VERSION}"));

            let mut client = Client::builder(&discord.token, intents)
                .activity(ActivityData::custom(status))
                .event_handler(event_handler)
                .await
                .context("failed to init discord client")?;

            client
                .start()
                .await
                .context("discord client shut down unexpectedly")
        };

        let res = tokio::try_join!(discord, startup);
        bot_data.shutdown();
        res?;
        Ok(())
    }

    /// Custom panic handler that writes the panic to the logger and flushes it.
    fn on_panic(info: &panic::PanicHookInfo<'_>) {
        use std::backtrace::Backtrace;
        use std::io::{Write as _, stdout};

        // the default hook doesn't go through the logger, and a log file
        // without the backtrace is useless for debugging
        let backtrace = Backtrace::force_capture();
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");

        // just in case the loggers fail or are empty
        _ = writeln!(stdout(), "thread '{name}' {info}");
        log::error!("thread '{name}' {info}\n{backtrace}");
        log::logger().flush();
    }

    fn profile() -> Result<Cow<'static, str>> {
        use std::env::VarError::NotPresent;
        use std::env::var;

        match var("BOWSER_PROFILE") {
            Ok(value) => Ok(value.into()),
            Err(NotPresent) => Ok("release".into()),
            Err(err) => Err(err).context("cannot load BOWSER_PROFILE env variable"),
        }
    }

    fn build_config() -> Result<HConfig> {
        use crate::config::setup::{Builder, Env, File, TomlText};

        let profile = profile()?;
        let profile_config = format!("bowser_app.{profile}.toml");
        let default_config = include_str!("../assets/default_config.toml");

        Builder::new()
            .add_layer(TomlText::new(default_config))
            .add_layer(File::new("bowser_app.toml").required(false))
            .add_layer(File::new(&profile_config).required(false))
            .add_layer(Env::new())
            .build()
    }

    fn init_logging(config: log4rs::config::RawConfig) -> anyhow::Result<()> {
        let deserializers = crate::logging::deserializers();
        let (appenders, errors) = config.appenders_lossy(&deserializers);
        if !errors.is_empty() {
            return Err(errors.into());
        }

        let config = log4rs::Config::builder()
            .appenders(appenders)
            .loggers(config.loggers())
            .build(config.root())?;

        log4rs::init_config(config)?;
        Ok(())
    }
}
