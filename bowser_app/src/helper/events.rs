use serenity::async_trait;
use serenity::futures::future::{BoxFuture, join_all};
use serenity::prelude::*;

use crate::prelude::*;

/// Handles incoming messages for one module.
///
/// Every registered handler sees every message; errors are logged with a
/// link to the message and never stop other handlers.
pub trait MessageHandler: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn message<'a>(
        &'a self,
        ctx: &'a Context,
        data: &'a Arc<HBotData>,
        msg: &'a Message,
    ) -> BoxFuture<'a, Result>;
}

/// The [`EventHandler`] given to serenity that fans out to all
/// [`MessageHandler`]s.
pub struct HEventHandler {
    data: Arc<HBotData>,
    handlers: Box<[Box<dyn MessageHandler>]>,
}

impl HEventHandler {
    /// Creates a new handler.
    pub fn new(data: Arc<HBotData>, handlers: Vec<Box<dyn MessageHandler>>) -> Self {
        Self {
            data,
            handlers: handlers.into_boxed_slice(),
        }
    }
}

#[async_trait]
impl EventHandler for HEventHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("Logged in as {}.", ready.user.name);

        self.data.wait_started().await;
        if let Err(why) = self.data.ready(&ctx) {
            log::error!("Failed to start periodic tasks: {why:?}");
        }
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let futs = self.handlers.iter().map(|h| async {
            if let Err(why) = h.message(&ctx, &self.data, &msg).await {
                log::error!("{} failed on {}: {why:?}", h.name(), msg.link());
            }
        });

        join_all(futs).await;
    }
}
