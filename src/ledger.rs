//! Progress Ledger
//!
//! Sole writer of a user's `UserProgress`. Owns the append-only event log,
//! the finished test results and the unlocked achievements, and derives the
//! `LearningStats` snapshot from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievements::{self, ACHIEVEMENTS};
use crate::stats;
use crate::types::{
    Achievement, LearningEvent, LearningStats, TestResult, UserAchievement, UserProgress,
    LEARNED_EXP, LEVEL_THRESHOLDS, MASTERED_EXP,
};

// ==================== Levels ====================

/// Level for a total experience, 1-based, capped at the last threshold.
pub fn level_from_exp(exp: u32) -> u32 {
    LEVEL_THRESHOLDS.iter().filter(|&&t| exp >= t).count().max(1) as u32
}

/// Experience still needed for the next level; 0 at the cap.
pub fn exp_to_next_level(exp: u32) -> u32 {
    let level = level_from_exp(exp) as usize;
    LEVEL_THRESHOLDS
        .get(level)
        .map_or(0, |next| next.saturating_sub(exp))
}

/// Percentage of the way through the current level; 100 at the cap.
pub fn level_progress(exp: u32) -> f64 {
    let level = level_from_exp(exp) as usize;
    let floor = LEVEL_THRESHOLDS[level - 1];
    match LEVEL_THRESHOLDS.get(level) {
        Some(&ceil) => (exp - floor) as f64 / (ceil - floor) as f64 * 100.0,
        None => 100.0,
    }
}

// ==================== Ledger ====================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressLedger {
    progress: UserProgress,
    stats: LearningStats,
    events: Vec<LearningEvent>,
    test_results: Vec<TestResult>,
    achievements: Vec<UserAchievement>,
}

impl ProgressLedger {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let user_id = user_id.into();
        Self {
            stats: LearningStats::new(user_id.clone(), now),
            progress: UserProgress::new(user_id),
            events: Vec::new(),
            test_results: Vec::new(),
            achievements: Vec::new(),
        }
    }

    /// Rebuild from persisted pieces. Study time is recomputed from the log.
    pub fn from_parts(
        progress: UserProgress,
        events: Vec<LearningEvent>,
        test_results: Vec<TestResult>,
        achievements: Vec<UserAchievement>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut stats = LearningStats::new(progress.user_id.clone(), now);
        stats.total_study_time = events.iter().map(|e| e.time_spent as u64).sum();
        stats.streak = progress.streak;
        Self {
            progress,
            stats,
            events,
            test_results,
            achievements,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.progress.user_id
    }

    pub fn progress(&self) -> &UserProgress {
        &self.progress
    }

    pub fn stats(&self) -> &LearningStats {
        &self.stats
    }

    pub fn events(&self) -> &[LearningEvent] {
        &self.events
    }

    pub fn test_results(&self) -> &[TestResult] {
        &self.test_results
    }

    pub fn achievements(&self) -> &[UserAchievement] {
        &self.achievements
    }

    pub fn set_goals(&mut self, daily_goal: u32, weekly_goal: u32) {
        self.progress.daily_goal = daily_goal;
        self.progress.weekly_goal = weekly_goal;
    }

    /// Append an event, add its time to the study total and move the streak.
    pub fn record_event(&mut self, event: LearningEvent) {
        self.update_streak(event.timestamp);
        self.stats.total_study_time += event.time_spent as u64;
        self.stats.last_updated = event.timestamp;
        tracing::debug!(
            word_id = %event.word_id,
            action = event.action.as_str(),
            correct = event.correct,
            "event recorded"
        );
        self.events.push(event);
    }

    fn update_streak(&mut self, at: DateTime<Utc>) {
        let today = at.date_naive();
        let streak = match self.progress.last_study_date.map(|d| d.date_naive()) {
            None => 1,
            Some(last) => match (today - last).num_days() {
                d if d < 0 => return,
                0 => self.progress.streak.max(1),
                1 => self.progress.streak + 1,
                _ => 1,
            },
        };
        self.progress.streak = streak;
        self.progress.last_study_date = Some(at);
        self.stats.streak = streak;
    }

    pub fn record_test_result(&mut self, result: TestResult) {
        self.test_results.push(result);
    }

    /// Highest score across finished tests.
    pub fn best_score(&self) -> Option<u32> {
        self.test_results.iter().map(|r| r.score).max()
    }

    /// Returns `false` when the word was already learned.
    pub fn mark_learned(&mut self, word_id: &str) -> bool {
        if !self.progress.learned_words.insert(word_id.to_string()) {
            return false;
        }
        self.progress.total_words = self.progress.learned_words.len();
        self.grant_exp(LEARNED_EXP);
        true
    }

    /// Returns `false` when the word was already mastered.
    pub fn mark_mastered(&mut self, word_id: &str) -> bool {
        if !self.progress.mastered_words.insert(word_id.to_string()) {
            return false;
        }
        self.grant_exp(MASTERED_EXP);
        tracing::info!(user_id = %self.progress.user_id, word_id, "word mastered");
        true
    }

    fn grant_exp(&mut self, exp: u32) {
        let before = self.progress.current_level;
        self.progress.total_exp = self.progress.total_exp.saturating_add(exp);
        self.progress.current_level = level_from_exp(self.progress.total_exp);
        if self.progress.current_level > before {
            tracing::info!(
                user_id = %self.progress.user_id,
                level = self.progress.current_level,
                "level up"
            );
        }
    }

    pub fn is_unlocked(&self, achievement_id: &str) -> bool {
        self.achievements
            .iter()
            .any(|a| a.achievement_id == achievement_id)
    }

    /// Unlock once and grant the reward. Unknown ids unlock without reward.
    pub fn unlock_achievement(&mut self, achievement_id: &str, now: DateTime<Utc>) -> bool {
        if self.is_unlocked(achievement_id) {
            return false;
        }
        self.achievements.push(UserAchievement {
            user_id: self.progress.user_id.clone(),
            achievement_id: achievement_id.to_string(),
            unlocked_at: now,
            progress: 100,
        });
        if let Some(def) = achievements::find(achievement_id) {
            self.grant_exp(def.exp);
        }
        tracing::info!(user_id = %self.progress.user_id, achievement_id, "achievement unlocked");
        true
    }

    /// Set the progress of an existing record, clamped to 100.
    pub fn update_achievement_progress(&mut self, achievement_id: &str, progress: u8) -> bool {
        match self
            .achievements
            .iter_mut()
            .find(|a| a.achievement_id == achievement_id)
        {
            Some(record) => {
                record.progress = progress.min(100);
                true
            }
            None => false,
        }
    }

    /// Unlock every definition whose condition now holds.
    pub fn evaluate_achievements(&mut self, now: DateTime<Utc>) -> Vec<&'static Achievement> {
        let best = self.best_score();
        let mut unlocked = Vec::new();
        for def in ACHIEVEMENTS.iter() {
            if def.condition.is_met(&self.progress, best) && self.unlock_achievement(def.id, now) {
                unlocked.push(def);
            }
        }
        unlocked
    }

    /// Recompute the stats snapshot from the log and test history.
    pub fn refresh_stats(
        &mut self,
        weak_threshold: f64,
        strong_threshold: f64,
        now: DateTime<Utc>,
    ) -> &LearningStats {
        let weekly = stats::weekly_summary(&self.events, self.progress.daily_goal, now);
        self.stats.total_words_learned = self.progress.learned_words.len();
        self.stats.average_accuracy = stats::test_accuracy(&self.test_results);
        self.stats.streak = self.progress.streak;
        self.stats.weekly_progress = weekly.progress;
        self.stats.weak_words = stats::weak_words(&self.events, weak_threshold);
        self.stats.strong_words = stats::strong_words(&self.events, strong_threshold);
        self.stats.last_updated = now;
        &self.stats
    }
}
