use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::learning::SessionLimits;
use crate::types::{DEFAULT_DAILY_GOAL, DEFAULT_SECONDS_PER_QUESTION, DEFAULT_WEEKLY_GOAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyConfig {
    pub daily_goal: u32,
    pub weekly_goal: u32,
    pub new_words_per_session: usize,
    pub review_words_per_session: usize,
    pub question_count: usize,
    pub seconds_per_question: u32,
    pub weak_threshold: f64,
    pub strong_threshold: f64,
    /// Consecutive correct answers that promote a learned word to mastered
    pub mastery_streak: usize,
    pub log_level: String,
}

impl Default for StudyConfig {
    fn default() -> Self {
        let limits = SessionLimits::default();
        Self {
            daily_goal: DEFAULT_DAILY_GOAL,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            new_words_per_session: limits.new_words,
            review_words_per_session: limits.review_words,
            question_count: crate::generator::DEFAULT_QUESTION_COUNT,
            seconds_per_question: DEFAULT_SECONDS_PER_QUESTION,
            weak_threshold: 0.6,
            strong_threshold: 0.8,
            mastery_streak: 3,
            log_level: "info".to_string(),
        }
    }
}

impl StudyConfig {
    /// Read `DANCI_*` variables, keeping the default for anything unset or
    /// unparsable.
    pub fn from_env() -> Self {
        Self::from_lookup_lenient(|key| std::env::var(key).ok())
    }

    /// Strict variant of `from_env`: a malformed value is an error.
    pub fn try_from_env() -> CoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> CoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let config = Self {
            daily_goal: parse_var(&lookup, "DANCI_DAILY_GOAL", d.daily_goal)?,
            weekly_goal: parse_var(&lookup, "DANCI_WEEKLY_GOAL", d.weekly_goal)?,
            new_words_per_session: parse_var(&lookup, "DANCI_NEW_WORDS", d.new_words_per_session)?,
            review_words_per_session: parse_var(
                &lookup,
                "DANCI_REVIEW_WORDS",
                d.review_words_per_session,
            )?,
            question_count: parse_var(&lookup, "DANCI_QUESTION_COUNT", d.question_count)?,
            seconds_per_question: parse_var(
                &lookup,
                "DANCI_SECONDS_PER_QUESTION",
                d.seconds_per_question,
            )?,
            weak_threshold: parse_var(&lookup, "DANCI_WEAK_THRESHOLD", d.weak_threshold)?,
            strong_threshold: parse_var(&lookup, "DANCI_STRONG_THRESHOLD", d.strong_threshold)?,
            mastery_streak: parse_var(&lookup, "DANCI_MASTERY_STREAK", d.mastery_streak)?,
            log_level: lookup("RUST_LOG").unwrap_or(d.log_level),
        };
        config.validate()?;
        Ok(config)
    }

    /// Per-variable fallback: a bad value only resets its own field.
    pub fn from_lookup_lenient<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let threshold = |key: &str, default: f64| {
            let value = lenient_var(&lookup, key, default);
            if (0.0..=1.0).contains(&value) {
                value
            } else {
                default
            }
        };
        Self {
            daily_goal: lenient_var(&lookup, "DANCI_DAILY_GOAL", d.daily_goal),
            weekly_goal: lenient_var(&lookup, "DANCI_WEEKLY_GOAL", d.weekly_goal),
            new_words_per_session: lenient_var(&lookup, "DANCI_NEW_WORDS", d.new_words_per_session),
            review_words_per_session: lenient_var(
                &lookup,
                "DANCI_REVIEW_WORDS",
                d.review_words_per_session,
            ),
            question_count: lenient_var(&lookup, "DANCI_QUESTION_COUNT", d.question_count),
            seconds_per_question: lenient_var(
                &lookup,
                "DANCI_SECONDS_PER_QUESTION",
                d.seconds_per_question,
            ),
            weak_threshold: threshold("DANCI_WEAK_THRESHOLD", d.weak_threshold),
            strong_threshold: threshold("DANCI_STRONG_THRESHOLD", d.strong_threshold),
            mastery_streak: match lenient_var(&lookup, "DANCI_MASTERY_STREAK", d.mastery_streak) {
                0 => d.mastery_streak,
                n => n,
            },
            log_level: lookup("RUST_LOG").unwrap_or(d.log_level),
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [
            ("weak_threshold", self.weak_threshold),
            ("strong_threshold", self.strong_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoreError::Config(format!("{name} must be within 0..=1, got {value}")));
            }
        }
        if self.mastery_streak == 0 {
            return Err(CoreError::Config("mastery_streak must be positive".to_string()));
        }
        Ok(())
    }

    pub fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            new_words: self.new_words_per_session,
            review_words: self.review_words_per_session,
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> CoreResult<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| CoreError::Config(format!("invalid value for {key}: {raw:?}"))),
    }
}

fn lenient_var<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|raw| raw.trim().parse::<T>().ok())
        .unwrap_or(default)
}
