use std::time::Duration;

use crate::quiz::generator::DEFAULT_QUESTION_COUNT;
use crate::quiz::reveal::DEFAULT_REVEAL_DELAY;

const QUESTION_COUNT_VAR: &str = "QUIZ_QUESTION_COUNT";
const REVEAL_DELAY_VAR: &str = "QUIZ_REVEAL_DELAY_MS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How many questions a single quiz asks at most.
    pub question_count: usize,
    /// How long an answer stays revealed before the next question.
    pub reveal_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            question_count: DEFAULT_QUESTION_COUNT,
            reveal_delay: DEFAULT_REVEAL_DELAY,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(QUESTION_COUNT_VAR) {
            config.question_count = match value.trim().parse::<usize>() {
                Ok(count) if count > 0 => count,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: QUESTION_COUNT_VAR,
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup(REVEAL_DELAY_VAR) {
            let millis = value.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                var: REVEAL_DELAY_VAR,
                value: value.clone(),
            })?;
            config.reveal_delay = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.question_count, 5);
        assert_eq!(config.reveal_delay, Duration::from_secs(1));
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            (QUESTION_COUNT_VAR, "10"),
            (REVEAL_DELAY_VAR, " 250 "),
        ]))
        .unwrap();
        assert_eq!(config.question_count, 10);
        assert_eq!(config.reveal_delay, Duration::from_millis(250));
    }

    #[test]
    fn rejects_zero_questions() {
        let err = Config::from_lookup(lookup(&[(QUESTION_COUNT_VAR, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: QUESTION_COUNT_VAR,
                value: "0".to_string()
            }
        );
    }

    #[test]
    fn rejects_garbage_delay() {
        assert!(Config::from_lookup(lookup(&[(REVEAL_DELAY_VAR, "soon")])).is_err());
    }
}
