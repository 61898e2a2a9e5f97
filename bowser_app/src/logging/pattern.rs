//! Defines a `"default"` encoder kind so the config doesn't need to repeat the
//! pattern for every appender.

use log4rs::config::{Deserialize, Deserializers};
use log4rs::encode::Encode;
use log4rs::encode::pattern::PatternEncoder;

const WITH_TIME: &str = "{d(%Y-%m-%d %H:%M:%S)(utc)} {h({l:<5})} [{t}] {m}{n}";
const NO_TIME: &str = "{h({l:<5})} [{t}] {m}{n}";

const fn default_true() -> bool {
    true
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BowserPatternConfig {
    /// Include the UTC timestamp. Service managers usually add their own.
    #[serde(default = "default_true")]
    time: bool,
}

pub struct BowserPatternDeserializer;

impl Deserialize for BowserPatternDeserializer {
    type Trait = dyn Encode;
    type Config = BowserPatternConfig;

    fn deserialize(
        &self,
        config: Self::Config,
        _deserializers: &Deserializers,
    ) -> anyhow::Result<Box<Self::Trait>> {
        let pattern = if config.time { WITH_TIME } else { NO_TIME };
        Ok(Box::new(PatternEncoder::new(pattern)))
    }
}
