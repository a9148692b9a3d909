//! Recommendation Ranker
//!
//! Orders words by review priority. Unseen words get maximal error and
//! recency scores so they surface first on a cold start.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{LearningEvent, WordEntry};

const ERROR_WEIGHT: f64 = 0.4;
const RECENCY_WEIGHT: f64 = 0.3;
const DIFFICULTY_WEIGHT: f64 = 0.3;
const DIFFICULTY_BONUS_PER_LEVEL: f64 = 0.3;
/// Days after which recency saturates at 1.0
const RECENCY_HORIZON_DAYS: f64 = 30.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

pub const DEFAULT_RECOMMEND_COUNT: usize = 10;

/// Score breakdown for one word
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordPriority {
    pub word_id: String,
    pub error_rate: f64,
    pub recency_score: f64,
    pub difficulty_bonus: f64,
    pub score: f64,
}

#[derive(Debug, Default, Clone, Copy)]
struct WordHistory {
    total: usize,
    incorrect: usize,
    last: Option<DateTime<Utc>>,
}

fn summarize(history: &[LearningEvent]) -> HashMap<&str, WordHistory> {
    let mut map: HashMap<&str, WordHistory> = HashMap::new();
    for event in history.iter().filter(|e| e.action.is_attempt()) {
        let entry = map.entry(event.word_id.as_str()).or_default();
        entry.total += 1;
        if !event.correct {
            entry.incorrect += 1;
        }
        entry.last = Some(entry.last.map_or(event.timestamp, |t| t.max(event.timestamp)));
    }
    map
}

fn error_rate(h: Option<&WordHistory>) -> f64 {
    match h {
        Some(h) if h.total > 0 => h.incorrect as f64 / h.total as f64,
        _ => 1.0,
    }
}

fn recency_score(h: Option<&WordHistory>, now: DateTime<Utc>) -> f64 {
    match h.and_then(|h| h.last) {
        Some(last) => {
            let days = (now - last).num_seconds() as f64 / SECONDS_PER_DAY;
            (days / RECENCY_HORIZON_DAYS).clamp(0.0, 1.0)
        }
        None => 1.0,
    }
}

fn priority(word: &WordEntry, h: Option<&WordHistory>, now: DateTime<Utc>) -> WordPriority {
    let error_rate = error_rate(h);
    let recency_score = recency_score(h, now);
    let difficulty_bonus = word.difficulty as f64 * DIFFICULTY_BONUS_PER_LEVEL;
    WordPriority {
        word_id: word.id.clone(),
        error_rate,
        recency_score,
        difficulty_bonus,
        score: ERROR_WEIGHT * error_rate
            + RECENCY_WEIGHT * recency_score
            + DIFFICULTY_WEIGHT * difficulty_bonus,
    }
}

/// Priority of every word, in input order.
pub fn score_words(
    words: &[WordEntry],
    history: &[LearningEvent],
    now: DateTime<Utc>,
) -> Vec<WordPriority> {
    let stats = summarize(history);
    words
        .iter()
        .map(|w| priority(w, stats.get(w.id.as_str()), now))
        .collect()
}

/// Top `count` words by descending score. Equal scores keep input order.
pub fn rank<'a>(
    words: &'a [WordEntry],
    history: &[LearningEvent],
    count: usize,
    now: DateTime<Utc>,
) -> Vec<&'a WordEntry> {
    let scores = score_words(words, history, now);
    let mut order: Vec<usize> = (0..words.len()).collect();
    // sort_by is stable
    order.sort_by(|&a, &b| scores[b].score.total_cmp(&scores[a].score));
    order.into_iter().take(count).map(|i| &words[i]).collect()
}
