//! Achievement definitions and unlock conditions.

use crate::types::{Achievement, AchievementCondition, UserProgress};

pub static ACHIEVEMENTS: [Achievement; 4] = [
    Achievement {
        id: "first_word",
        name: "初来乍到",
        description: "学习第一个单词",
        icon: "🎯",
        condition: AchievementCondition::LearnedWords(1),
        exp: 10,
    },
    Achievement {
        id: "week_streak",
        name: "坚持不懈",
        description: "连续学习7天",
        icon: "🔥",
        condition: AchievementCondition::Streak(7),
        exp: 50,
    },
    Achievement {
        id: "word_master",
        name: "词汇大师",
        description: "掌握100个单词",
        icon: "👑",
        condition: AchievementCondition::MasteredWords(100),
        exp: 100,
    },
    Achievement {
        id: "perfect_score",
        name: "完美表现",
        description: "测试获得满分",
        icon: "⭐",
        condition: AchievementCondition::PerfectScore,
        exp: 30,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

fn percent(current: usize, target: usize) -> u8 {
    if target == 0 {
        return 100;
    }
    ((current.min(target) * 100) / target) as u8
}

impl AchievementCondition {
    /// `best_score` is the highest test score seen so far, if any.
    pub fn is_met(&self, progress: &UserProgress, best_score: Option<u32>) -> bool {
        self.progress(progress, best_score) >= 100
    }

    /// Completion towards the condition, 0-100
    pub fn progress(&self, progress: &UserProgress, best_score: Option<u32>) -> u8 {
        match *self {
            Self::LearnedWords(n) => percent(progress.learned_words.len(), n),
            Self::Streak(days) => percent(progress.streak as usize, days as usize),
            Self::MasteredWords(n) => percent(progress.mastered_words.len(), n),
            Self::PerfectScore => best_score.map_or(0, |s| s.min(100) as u8),
        }
    }
}
