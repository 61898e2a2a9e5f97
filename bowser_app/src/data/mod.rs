use std::sync::{Mutex, OnceLock};

use serenity::prelude::*;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::commands::{Command, CommandHandler};
use crate::config::HBotConfig;
use crate::helper::events::MessageHandler;
use crate::modules::{Module as _, for_each_module};
use crate::prelude::*;

/// A general color that can be used for embeds indicating errors.
pub const ERROR_EMBED_COLOR: Colour = Colour::new(0xCF_67_5A);

/// Color for moderation log embeds.
pub const LOG_EMBED_COLOR: Colour = Colour::new(0xF5_A6_23);

/// A simple error that can return any error message.
///
/// These are shown to the command invoker as-is.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{msg}")]
#[must_use]
pub struct HArgError {
    /// The error message
    pub msg: Cow<'static, str>,
}

impl HArgError {
    pub const fn new_const(msg: &'static str) -> Self {
        Self {
            msg: Cow::Borrowed(msg),
        }
    }

    pub fn new(msg: impl Into<Cow<'static, str>>) -> Self {
        Self { msg: msg.into() }
    }
}

/// The global bot data. Only one instance exists per bot.
#[derive(Debug)]
pub struct HBotData {
    /// The bot configuration.
    config: HBotConfig,
    /// Database connection.
    database: OnceLock<mongodb::Database>,
    /// Shared HTTP client for non-Discord APIs.
    http: reqwest::Client,
    /// Set once [`Self::startup`] has finished.
    started: watch::Sender<bool>,
    /// Periodic tasks spawned on ready.
    tasks: Mutex<Option<Vec<JoinHandle<()>>>>,
}

impl HBotData {
    /// Creates a new instance.
    #[must_use]
    pub fn new(config: HBotConfig) -> Self {
        Self {
            config,
            database: OnceLock::new(),
            http: reqwest::Client::new(),
            started: watch::Sender::new(false),
            tasks: Mutex::new(None),
        }
    }

    /// Gets the bot configuration.
    #[must_use]
    pub fn config(&self) -> &HBotConfig {
        &self.config
    }

    /// Gets the database connection.
    pub fn database(&self) -> Result<&mongodb::Database> {
        self.database.get().context("database is not connected")
    }

    /// Gets the HTTP client used for external APIs.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Gets the init data needed based on the enabled modules.
    pub fn init(&self) -> Result<HInit> {
        let config = self.config();
        let mut init = HInit::default();
        let mut commands: Vec<Command> = Vec::new();

        for_each_module!(config, |m| {
            m.validate(config)?;
            init.intents |= m.intents(config);
            commands.extend(m.commands(config));
            init.event_handlers.extend(m.message_handler()?);
        });

        if !commands.is_empty() {
            init.intents |= GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;
            let handler = CommandHandler::new(config.prefix.clone(), commands)?;
            init.event_handlers.push(Box::new(handler));
        }

        Ok(init)
    }

    /// Performs startup tasks, like connecting to a database and other needed
    /// services. Tasks are run in sequence.
    pub async fn startup(self: Arc<Self>) -> Result {
        Arc::clone(&self).connect_database().await?;

        for_each_module!(self.config(), |m| {
            m.startup(Arc::clone(&self)).await?;
        });

        self.started.send_replace(true);
        log::debug!("Startup complete.");
        Ok(())
    }

    /// Waits until [`Self::startup`] has finished.
    ///
    /// Never returns if startup fails.
    pub async fn wait_started(&self) {
        let mut started = self.started.subscribe();

        // the sender lives in `self`, so this can't fail
        _ = started.wait_for(|s| *s).await;
    }

    /// Called in ready to spawn the periodic tasks.
    ///
    /// Ready may fire again after a reconnect, so this only acts once. Must
    /// only be called after [`Self::wait_started`] resolved, since the tasks
    /// need the database connections.
    pub fn ready(self: &Arc<Self>, ctx: &Context) -> Result {
        let mut tasks = self
            .tasks
            .lock()
            .map_err(|_| anyhow::anyhow!("task list lock is poisoned"))?;

        if tasks.is_some() {
            return Ok(());
        }

        let mut spawned = Vec::new();
        for_each_module!(self.config(), |m| {
            spawned.extend(m.tasks(ctx, self));
        });

        log::info!("Started {} periodic tasks.", spawned.len());
        *tasks = Some(spawned);
        Ok(())
    }

    /// Aborts all periodic tasks.
    pub fn shutdown(&self) {
        if let Ok(mut tasks) = self.tasks.lock()
            && let Some(tasks) = tasks.take()
        {
            for task in tasks {
                task.abort();
            }
        }
    }

    async fn connect_database(self: Arc<Self>) -> Result {
        if let Some(uri) = &self.config().mongodb_uri {
            let client = mongodb::Client::with_uri_str(uri)
                .await
                .context("failed to connect to database cluster")?;

            let db = client
                .default_database()
                .context("no default database specified")?;

            if self.database.set(db.clone()).is_err() {
                anyhow::bail!("can only connect to database once");
            }

            for_each_module!(self.config(), |m| {
                m.db_init(Arc::clone(&self), db.clone()).await?;
            });

            log::info!("Connected to MongoDB.");
        }

        Ok(())
    }
}

/// Data needed for bot startup.
pub struct HInit {
    /// Intents used by this app.
    pub intents: GatewayIntents,
    /// Message handlers to register, including the command dispatcher.
    pub event_handlers: Vec<Box<dyn MessageHandler>>,
}

impl Default for HInit {
    fn default() -> Self {
        Self {
            // default isn't empty but non_privileged and we need empty
            intents: GatewayIntents::empty(),
            event_handlers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::HBotData;
    use crate::config::HConfig;
    use crate::config::setup::{Builder, TomlText};
    use crate::prelude::*;

    fn data() -> Arc<HBotData> {
        let config: HConfig = Builder::new()
            .add_layer(TomlText::new(include_str!("../../assets/default_config.toml")))
            .add_layer(TomlText::new("[discord]\ntoken = \"abc\""))
            .build()
            .expect("default config is valid");

        Arc::new(HBotData::new(config.bot))
    }

    #[tokio::test]
    async fn ready_waits_for_startup() {
        let data = data();
        let waiter = tokio::spawn({
            let data = Arc::clone(&data);
            async move { data.wait_started().await }
        });

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished(), "must wait while startup is pending");

        Arc::clone(&data).startup().await.expect("startup without modules works");
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("must resume after startup")
            .expect("waiter doesn't panic");
    }

    #[tokio::test]
    async fn wait_after_startup_is_immediate() {
        let data = data();
        Arc::clone(&data).startup().await.expect("startup without modules works");

        tokio::time::timeout(Duration::from_secs(1), data.wait_started())
            .await
            .expect("startup already finished");
    }
}
