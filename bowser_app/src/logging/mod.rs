use log4rs::config::Deserializers;

mod pattern;
mod target_filter;

/// Gets the log4rs deserializers including the app-specific kinds.
pub fn deserializers() -> Deserializers {
    let mut d = Deserializers::new();
    d.insert("default", pattern::BowserPatternDeserializer);
    d.insert("target", target_filter::TargetFilterDeserializer);
    d
}
