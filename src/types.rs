//! Common Types and Constants
//!
//! Shared data structures used across the catalog, scheduling, quiz and
//! progress modules.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ==================== Constants ====================

/// Review intervals in days, indexed by consecutive correct answers
pub const REVIEW_INTERVAL_DAYS: [i64; 6] = [1, 2, 4, 7, 15, 30];

/// Experience thresholds; index + 1 is the level
pub const LEVEL_THRESHOLDS: [u32; 10] = [0, 50, 150, 300, 500, 750, 1050, 1400, 1800, 2250];

/// Experience granted the first time a word is learned
pub const LEARNED_EXP: u32 = 5;

/// Experience granted the first time a word is mastered
pub const MASTERED_EXP: u32 = 10;

/// Options shown by a choice question, correct answer included
pub const CHOICE_OPTION_COUNT: usize = 4;

/// Placeholder that replaces the target word in fill-blank prompts
pub const BLANK_MARKER: &str = "____";

/// Per-question time budget of a test
pub const DEFAULT_SECONDS_PER_QUESTION: u32 = 60;

pub const DEFAULT_DAILY_GOAL: u32 = 20;
pub const DEFAULT_WEEKLY_GOAL: u32 = 140;

// ==================== Catalog Types ====================

/// One sense of a word
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// Part of speech label, e.g. `n.` or `v.`
    pub part_of_speech: String,
    /// Source-language (English) meaning
    pub meaning: String,
    /// Native-language (Chinese) meaning
    pub chinese_meaning: String,
}

/// Example sentence with its translation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Example {
    pub sentence: String,
    pub translation: String,
}

/// Vocabulary entry, immutable once loaded
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    pub id: String,
    /// Surface form
    pub text: String,
    pub phonetic: String,
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub examples: Vec<Example>,
    /// Difficulty 1-5
    pub difficulty: u8,
    /// Usage frequency, higher is more common
    pub frequency: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WordEntry {
    /// Chinese meaning of the first definition, empty when there is none
    pub fn primary_meaning(&self) -> &str {
        self.definitions
            .first()
            .map(|d| d.chinese_meaning.as_str())
            .unwrap_or("")
    }

    pub fn first_example(&self) -> Option<&Example> {
        self.examples.first()
    }

    pub fn has_part_of_speech(&self, pos: &str) -> bool {
        self.definitions.iter().any(|d| d.part_of_speech == pos)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn difficulty_band(&self) -> DifficultyBand {
        DifficultyBand::from_difficulty(self.difficulty)
    }
}

/// Coarse grouping of the 1-5 difficulty scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyBand {
    Easy,
    Medium,
    Hard,
}

impl DifficultyBand {
    pub fn from_difficulty(difficulty: u8) -> Self {
        match difficulty {
            0..=2 => Self::Easy,
            3 => Self::Medium,
            _ => Self::Hard,
        }
    }
}

// ==================== Learning Events ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningAction {
    Learned,
    Reviewed,
    Tested,
    Mastered,
}

impl LearningAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learned => "learned",
            Self::Reviewed => "reviewed",
            Self::Tested => "tested",
            Self::Mastered => "mastered",
        }
    }

    /// Whether the event answers the word. Promotions are bookkeeping.
    pub fn is_attempt(&self) -> bool {
        !matches!(self, Self::Mastered)
    }
}

/// Append-only record of one interaction with a word
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningEvent {
    pub id: String,
    pub word_id: String,
    pub user_id: String,
    pub action: LearningAction,
    pub correct: bool,
    /// Seconds spent on the word
    pub time_spent: u32,
    /// Perceived difficulty 1-5
    pub difficulty: u8,
    pub timestamp: DateTime<Utc>,
}

impl LearningEvent {
    pub fn new(
        word_id: impl Into<String>,
        user_id: impl Into<String>,
        action: LearningAction,
        correct: bool,
        time_spent: u32,
        difficulty: u8,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            word_id: word_id.into(),
            user_id: user_id.into(),
            action,
            correct,
            time_spent,
            difficulty,
            timestamp,
        }
    }
}

// ==================== User State ====================

/// Aggregate progress of one user, written only by the ledger
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub total_words: usize,
    pub learned_words: BTreeSet<String>,
    pub mastered_words: BTreeSet<String>,
    pub current_level: u32,
    pub total_exp: u32,
    /// Consecutive study days
    pub streak: u32,
    pub last_study_date: Option<DateTime<Utc>>,
    pub daily_goal: u32,
    pub weekly_goal: u32,
}

impl UserProgress {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            total_words: 0,
            learned_words: BTreeSet::new(),
            mastered_words: BTreeSet::new(),
            current_level: 1,
            total_exp: 0,
            streak: 0,
            last_study_date: None,
            daily_goal: DEFAULT_DAILY_GOAL,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
        }
    }

    pub fn is_learned(&self, word_id: &str) -> bool {
        self.learned_words.contains(word_id)
    }

    pub fn is_mastered(&self, word_id: &str) -> bool {
        self.mastered_words.contains(word_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelPreference {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub user_id: String,
    pub daily_goal: u32,
    pub study_reminders: bool,
    /// Local time of day, `HH:MM`
    pub reminder_time: String,
    pub sound_enabled: bool,
    pub theme: Theme,
    pub difficulty: LevelPreference,
    pub auto_play_audio: bool,
}

impl UserSettings {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            daily_goal: DEFAULT_DAILY_GOAL,
            study_reminders: true,
            reminder_time: "20:00".to_string(),
            sound_enabled: true,
            theme: Theme::Light,
            difficulty: LevelPreference::Beginner,
            auto_play_audio: true,
        }
    }

    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.daily_goal {
            self.daily_goal = v;
        }
        if let Some(v) = patch.study_reminders {
            self.study_reminders = v;
        }
        if let Some(v) = patch.reminder_time {
            self.reminder_time = v;
        }
        if let Some(v) = patch.sound_enabled {
            self.sound_enabled = v;
        }
        if let Some(v) = patch.theme {
            self.theme = v;
        }
        if let Some(v) = patch.difficulty {
            self.difficulty = v;
        }
        if let Some(v) = patch.auto_play_audio {
            self.auto_play_audio = v;
        }
    }
}

/// Partial settings update; `None` fields are left untouched
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    pub daily_goal: Option<u32>,
    pub study_reminders: Option<bool>,
    pub reminder_time: Option<String>,
    pub sound_enabled: Option<bool>,
    pub theme: Option<Theme>,
    pub difficulty: Option<LevelPreference>,
    pub auto_play_audio: Option<bool>,
}

/// Snapshot of derived statistics shown on the stats view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningStats {
    pub user_id: String,
    pub total_words_learned: usize,
    pub average_accuracy: f64,
    /// Seconds
    pub total_study_time: u64,
    pub streak: u32,
    pub weekly_progress: f64,
    pub weak_words: Vec<String>,
    pub strong_words: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

impl LearningStats {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            total_words_learned: 0,
            average_accuracy: 0.0,
            total_study_time: 0,
            streak: 0,
            weekly_progress: 0.0,
            weak_words: Vec::new(),
            strong_words: Vec::new(),
            last_updated: now,
        }
    }
}

// ==================== Quiz Types ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    Choice,
    FillBlank,
    Spelling,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 3] = [Self::Choice, Self::FillBlank, Self::Spelling];

    /// Prefix of generated question ids
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Choice => "choice",
            Self::FillBlank => "fill",
            Self::Spelling => "spelling",
        }
    }
}

/// Immutable quiz question
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestQuestion {
    pub id: String,
    pub word_id: String,
    pub kind: QuestionKind,
    pub prompt: String,
    /// Present for choice questions only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub correct_answer: String,
    pub explanation: String,
}

impl TestQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestMode {
    /// Choice questions only
    Choice,
    /// Choice, fill-blank and spelling
    #[default]
    Mixed,
}

impl TestMode {
    pub fn allowed_kinds(&self) -> &'static [QuestionKind] {
        match self {
            Self::Choice => &[QuestionKind::Choice],
            Self::Mixed => &QuestionKind::ALL,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub id: String,
    pub user_id: String,
    pub mode: TestMode,
    pub questions: Vec<TestQuestion>,
    /// Parallel to `questions`, empty string when unanswered
    pub answers: Vec<String>,
    /// 0-100
    pub score: u32,
    pub total_questions: usize,
    /// Seconds
    pub time_spent: u32,
    pub timestamp: DateTime<Utc>,
}

impl TestResult {
    pub fn correct_count(&self) -> usize {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| q.is_correct(a))
            .count()
    }
}

// ==================== Achievements ====================

/// Unlock predicate of an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AchievementCondition {
    LearnedWords(usize),
    Streak(u32),
    MasteredWords(usize),
    PerfectScore,
}

/// Static achievement definition
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub condition: AchievementCondition,
    /// Experience reward on unlock
    pub exp: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAchievement {
    pub user_id: String,
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
    /// 0-100
    pub progress: u8,
}

// ==================== Sessions ====================

/// Which subset of the catalog a card session walks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    New,
    Review,
}
