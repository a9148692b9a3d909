//! Stats Aggregator
//!
//! Everything here is recomputed from the append-only event log on demand;
//! nothing is cached.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::types::{LearningEvent, TestResult};

pub const DEFAULT_WEAK_THRESHOLD: f64 = 0.5;
pub const DEFAULT_STRONG_THRESHOLD: f64 = 0.8;
/// Attempts required before a word may count as strong
pub const MIN_STRONG_ATTEMPTS: usize = 3;
pub const WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordTally {
    pub correct: usize,
    pub total: usize,
}

impl WordTally {
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Per-word correct/total counts, in order of first appearance.
pub fn word_tallies(history: &[LearningEvent]) -> Vec<(&str, WordTally)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<(&str, WordTally)> = Vec::new();
    for event in history.iter().filter(|e| e.action.is_attempt()) {
        let i = *index.entry(event.word_id.as_str()).or_insert_with(|| {
            tallies.push((event.word_id.as_str(), WordTally::default()));
            tallies.len() - 1
        });
        let tally = &mut tallies[i].1;
        tally.total += 1;
        if event.correct {
            tally.correct += 1;
        }
    }
    tallies
}

/// Words answered correctly less often than `threshold`.
pub fn weak_words(history: &[LearningEvent], threshold: f64) -> Vec<String> {
    word_tallies(history)
        .into_iter()
        .filter(|(_, t)| t.ratio() < threshold)
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Words at or above `threshold` with enough attempts to trust the ratio.
pub fn strong_words(history: &[LearningEvent], threshold: f64) -> Vec<String> {
    word_tallies(history)
        .into_iter()
        .filter(|(_, t)| t.ratio() >= threshold && t.total >= MIN_STRONG_ATTEMPTS)
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Fraction of questions answered correctly across finished tests.
pub fn test_accuracy(results: &[TestResult]) -> f64 {
    let total: usize = results.iter().map(|r| r.total_questions).sum();
    if total == 0 {
        return 0.0;
    }
    let correct: f64 = results
        .iter()
        .map(|r| (r.score as f64 / 100.0 * r.total_questions as f64).round())
        .sum();
    correct / total as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub records: usize,
    /// Seconds
    pub study_time: u64,
    /// Share of the weekly target reached, 0-100
    pub progress: f64,
}

/// Activity over the trailing seven days against `daily_goal` records a day.
pub fn weekly_summary(history: &[LearningEvent], daily_goal: u32, now: DateTime<Utc>) -> WeeklySummary {
    let since = now - Duration::days(WEEK_DAYS);
    let recent: Vec<&LearningEvent> = history
        .iter()
        .filter(|e| e.action.is_attempt() && e.timestamp >= since)
        .collect();
    let study_time = recent.iter().map(|e| e.time_spent as u64).sum();
    let progress = if daily_goal == 0 {
        0.0
    } else {
        (recent.len() as f64 / daily_goal as f64 / WEEK_DAYS as f64 * 100.0).min(100.0)
    };
    WeeklySummary {
        records: recent.len(),
        study_time,
        progress,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total: usize,
    pub correct: usize,
    pub words_reviewed: usize,
}

impl DailyStats {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

/// Per-day totals for days in `start..=end` that have activity, ascending.
pub fn daily_breakdown(history: &[LearningEvent], start: NaiveDate, end: NaiveDate) -> Vec<DailyStats> {
    let mut days: BTreeMap<NaiveDate, (usize, usize, HashSet<&str>)> = BTreeMap::new();
    for event in history.iter().filter(|e| e.action.is_attempt()) {
        let date = event.timestamp.date_naive();
        if date < start || date > end {
            continue;
        }
        let day = days.entry(date).or_default();
        day.0 += 1;
        if event.correct {
            day.1 += 1;
        }
        day.2.insert(event.word_id.as_str());
    }
    days.into_iter()
        .map(|(date, (total, correct, words))| DailyStats {
            date,
            total,
            correct,
            words_reviewed: words.len(),
        })
        .collect()
}
