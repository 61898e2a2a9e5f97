use serenity::prelude::*;
use tokio::task::JoinHandle;

use crate::commands::Command;
use crate::config::HBotConfig;
use crate::helper::events::MessageHandler;
use crate::prelude::*;

pub mod chat_filter;
pub mod core;
pub mod deals;
pub mod moderation;

mod prelude {
    pub use serenity::prelude::*;

    pub use super::Module as _;
    pub(crate) use crate::commands::command;
    pub use crate::commands::{Args, Command, CommandContext};
    pub use crate::config::HBotConfig;
    pub use crate::prelude::*;
}

mod model_prelude {
    pub use bson::oid::ObjectId;
    pub use bson::{Document, doc};
    pub use mongodb::options::IndexOptions;
    pub use mongodb::{Collection, IndexModel};
    pub use serde::{Deserialize, Serialize};
    pub use serde_with::serde_as;
    pub use serenity::model::id::*;

    pub use crate::helper::bson::{IdI64, ModelCollection};
    pub use crate::prelude::*;
}

/// Run an expression against every enabled module.
///
/// Syntax is:
///
/// ```ignore
/// for_each_module!(&config, |m| do_stuff(m));
/// ```
macro_rules! for_each_module {
    (@inner $module:expr, $config:expr, |$var:ident| $body:expr) => {{
        let $var = $module;
        if $crate::modules::Module::enabled(&$var, $config) {
            $body
        }
    }};
    ($config:expr, |$var:ident| $body:expr) => {{
        $crate::modules::for_each_module!(@inner $crate::modules::core::Module, $config, |$var| $body);
        $crate::modules::for_each_module!(@inner $crate::modules::deals::Module, $config, |$var| $body);
        $crate::modules::for_each_module!(@inner $crate::modules::chat_filter::Module, $config, |$var| $body);
        $crate::modules::for_each_module!(@inner $crate::modules::moderation::Module, $config, |$var| $body);
    }};
}

pub(crate) use for_each_module;

pub trait Module: Sized {
    /// Whether the module is enabled.
    fn enabled(&self, config: &HBotConfig) -> bool;

    /// The intents needed.
    fn intents(&self, config: &HBotConfig) -> GatewayIntents {
        _ = config;
        GatewayIntents::empty()
    }

    /// Text commands for this module.
    fn commands(&self, config: &HBotConfig) -> impl IntoIterator<Item = Command> {
        _ = config;
        []
    }

    /// Validates that the config is good.
    fn validate(&self, config: &HBotConfig) -> Result {
        _ = config;
        Ok(())
    }

    /// Handler for every incoming message, if the module needs one.
    fn message_handler(self) -> Result<Option<Box<dyn MessageHandler>>> {
        Ok(None)
    }

    /// Runs async startup code for this module.
    async fn startup(self, data: Arc<HBotData>) -> Result {
        _ = data;
        Ok(())
    }

    /// Initializes the database, generally creating indices.
    async fn db_init(self, data: Arc<HBotData>, db: mongodb::Database) -> Result {
        _ = data;
        _ = db;
        Ok(())
    }

    /// Spawns the periodic tasks once the gateway is ready.
    fn tasks(self, ctx: &Context, data: &Arc<HBotData>) -> Vec<JoinHandle<()>> {
        _ = ctx;
        _ = data;
        Vec::new()
    }
}
