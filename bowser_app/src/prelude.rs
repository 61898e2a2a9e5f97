pub use std::borrow::Cow;
pub use std::sync::Arc;

pub use anyhow::Context as _;
pub use serenity::builder::*;
pub use serenity::model::prelude::*;

pub use crate::data::{HArgError, HBotData};

/// Result alias defaulting to `()` and [`anyhow::Error`].
pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;
