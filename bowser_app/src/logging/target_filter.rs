use log::Record;
use log4rs::config::{Deserialize, Deserializers};
use log4rs::filter::{Filter, Response};

/// Filters records by their target prefix.
///
/// With `accept`, matching records are accepted regardless of later filters,
/// which keeps the bot's own messages visible when a threshold filter hides
/// noisy library output. With `reject`, matching records are dropped.
#[derive(Debug)]
pub struct TargetFilter {
    prefixes: Vec<String>,
    mode: Mode,
}

#[derive(Debug, Clone, Copy, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
enum Mode {
    Accept,
    Reject,
}

impl Filter for TargetFilter {
    fn filter(&self, record: &Record<'_>) -> Response {
        let target = record.target();
        if !self.prefixes.iter().any(|p| target.starts_with(p.as_str())) {
            return Response::Neutral;
        }

        match self.mode {
            Mode::Accept => Response::Accept,
            Mode::Reject => Response::Reject,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetFilterConfig {
    targets: Vec<String>,
    mode: Mode,
}

pub struct TargetFilterDeserializer;

impl Deserialize for TargetFilterDeserializer {
    type Trait = dyn Filter;
    type Config = TargetFilterConfig;

    fn deserialize(
        &self,
        config: Self::Config,
        _deserializers: &Deserializers,
    ) -> anyhow::Result<Box<Self::Trait>> {
        Ok(Box::new(TargetFilter {
            prefixes: config.targets,
            mode: config.mode,
        }))
    }
}

#[cfg(test)]
mod tests {
    use log::{Level, Record};
    use log4rs::filter::{Filter as _, Response};

    use super::{Mode, TargetFilter};

    fn check(filter: &TargetFilter, target: &str) -> Response {
        filter.filter(
            &Record::builder()
                .target(target)
                .level(Level::Info)
                .args(format_args!("test"))
                .build(),
        )
    }

    #[test]
    fn accepts_matching_prefix() {
        let filter = TargetFilter {
            prefixes: vec!["bowser_app".to_owned()],
            mode: Mode::Accept,
        };

        assert!(matches!(check(&filter, "bowser_app::modules::deals"), Response::Accept));
        assert!(matches!(check(&filter, "serenity::gateway"), Response::Neutral));
    }

    #[test]
    fn rejects_matching_prefix() {
        let filter = TargetFilter {
            prefixes: vec!["tracing".to_owned(), "h2".to_owned()],
            mode: Mode::Reject,
        };

        assert!(matches!(check(&filter, "h2::codec"), Response::Reject));
        assert!(matches!(check(&filter, "bowser_app"), Response::Neutral));
    }
}
