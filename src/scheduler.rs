//! Review Scheduler
//!
//! Fixed-interval forgetting curve: the interval grows with the number of
//! consecutive correct answers and is scaled by word difficulty.

use chrono::{DateTime, Duration, Utc};

use crate::types::{LearningEvent, WordEntry, REVIEW_INTERVAL_DAYS};

/// Minimum difficulty scale applied to the base interval
const MIN_INTERVAL_SCALE: f64 = 0.5;

/// Interval in whole days for the given difficulty and streak.
pub fn review_interval_days(difficulty: u8, consecutive_correct: usize) -> i64 {
    let idx = consecutive_correct.min(REVIEW_INTERVAL_DAYS.len() - 1);
    let base = REVIEW_INTERVAL_DAYS[idx] as f64;
    let scale = (difficulty as f64 / 3.0).max(MIN_INTERVAL_SCALE);
    (base * scale).floor() as i64
}

pub fn next_review_date(
    difficulty: u8,
    consecutive_correct: usize,
    last_reviewed: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let from = last_reviewed.unwrap_or(now);
    from + Duration::days(review_interval_days(difficulty, consecutive_correct))
}

pub fn is_due(
    last_reviewed: DateTime<Utc>,
    difficulty: u8,
    consecutive_correct: usize,
    now: DateTime<Utc>,
) -> bool {
    now >= next_review_date(difficulty, consecutive_correct, Some(last_reviewed), now)
}

/// Length of the most recent run of correct events for a word.
pub fn consecutive_correct(history: &[LearningEvent], word_id: &str) -> usize {
    let mut events: Vec<&LearningEvent> =
        history
        .iter()
        .filter(|e| e.word_id == word_id && e.action.is_attempt())
        .collect();
    events.sort_by_key(|e| e.timestamp);
    events.iter().rev().take_while(|e| e.correct).count()
}

pub fn last_reviewed(history: &[LearningEvent], word_id: &str) -> Option<DateTime<Utc>> {
    history
        .iter()
        .filter(|e| e.word_id == word_id)
        .map(|e| e.timestamp)
        .max()
}

/// Words with history whose next review date has passed, in input order.
/// Words never seen are left to the new-word flow.
pub fn due_words<'a>(
    words: &'a [WordEntry],
    history: &[LearningEvent],
    now: DateTime<Utc>,
) -> Vec<&'a WordEntry> {
    words
        .iter()
        .filter(|word| match last_reviewed(history, &word.id) {
            Some(last) => is_due(
                last,
                word.difficulty,
                consecutive_correct(history, &word.id),
                now,
            ),
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LearningAction;
    use chrono::TimeZone;

    fn jan(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    fn event(word: &str, correct: bool, at: DateTime<Utc>) -> LearningEvent {
        LearningEvent::new(word, "u", LearningAction::Reviewed, correct, 3, 3, at)
    }

    #[test]
    fn test_medium_difficulty_uses_base_interval() {
        let next = next_review_date(3, 2, Some(jan(1)), jan(20));
        assert_eq!(next, jan(5));
    }

    #[test]
    fn test_easy_words_floor_at_half_interval() {
        assert_eq!(review_interval_days(1, 0), 0);
        assert_eq!(review_interval_days(1, 3), 3);
        assert_eq!(review_interval_days(5, 1), 3);
    }

    #[test]
    fn test_streak_beyond_table_clamps() {
        assert_eq!(review_interval_days(3, 5), 30);
        assert_eq!(review_interval_days(3, 50), 30);
    }

    #[test]
    fn test_missing_last_reviewed_uses_now() {
        assert_eq!(next_review_date(3, 0, None, jan(10)), jan(11));
    }

    #[test]
    fn test_is_due_boundary() {
        assert!(!is_due(jan(1), 3, 2, jan(4)));
        assert!(is_due(jan(1), 3, 2, jan(5)));
    }

    #[test]
    fn test_consecutive_correct_counts_latest_run() {
        let history = vec![
            event("a", false, jan(1)),
            event("a", true, jan(2)),
            event("b", false, jan(3)),
            event("a", true, jan(4)),
        ];
        assert_eq!(consecutive_correct(&history, "a"), 2);
        assert_eq!(consecutive_correct(&history, "b"), 0);
        assert_eq!(consecutive_correct(&history, "c"), 0);
    }

    #[test]
    fn test_promotion_events_do_not_extend_run() {
        let history = vec![
            event("a", true, jan(1)),
            LearningEvent::new("a", "u", LearningAction::Mastered, true, 0, 3, jan(1)),
        ];
        assert_eq!(consecutive_correct(&history, "a"), 1);
    }

    #[test]
    fn test_due_words_skips_unseen() {
        let catalog = crate::catalog::WordCatalog::sample().unwrap();
        let history = vec![event("3", false, jan(1)), event("1", true, jan(10))];
        let due = due_words(catalog.words(), &history, jan(10));
        let ids: Vec<&str> = due.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["3"]);
    }
}
