//! Card sessions
//!
//! Deterministic word selection for new-word and review sessions, and the
//! flashcard flow that walks the selection and emits one learning event per
//! card.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::WordCatalog;
use crate::types::{LearningAction, LearningEvent, SessionMode, UserProgress, WordEntry};

/// Upper bounds on the size of a card session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLimits {
    pub new_words: usize,
    pub review_words: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            new_words: 10,
            review_words: 15,
        }
    }
}

pub fn select_session_words(
    words: &[WordEntry],
    progress: Option<&UserProgress>,
    mode: SessionMode,
) -> Vec<String> {
    select_session_words_with(words, progress, mode, SessionLimits::default())
}

/// `New`: words not yet learned. `Review`: learned but not mastered.
/// Both keep catalog order.
pub fn select_session_words_with(
    words: &[WordEntry],
    progress: Option<&UserProgress>,
    mode: SessionMode,
    limits: SessionLimits,
) -> Vec<String> {
    match mode {
        SessionMode::New => words
            .iter()
            .filter(|w| !progress.is_some_and(|p| p.is_learned(&w.id)))
            .take(limits.new_words)
            .map(|w| w.id.clone())
            .collect(),
        SessionMode::Review => match progress {
            Some(p) => words
                .iter()
                .filter(|w| p.is_learned(&w.id) && !p.is_mastered(&w.id))
                .take(limits.review_words)
                .map(|w| w.id.clone())
                .collect(),
            None => Vec::new(),
        },
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardSessionStats {
    pub total: usize,
    pub known: usize,
    pub unknown: usize,
}

/// Flashcard walk over a fixed list of word ids
#[derive(Debug, Clone)]
pub struct CardSession {
    mode: SessionMode,
    word_ids: Vec<String>,
    index: usize,
    stats: CardSessionStats,
    card_started_at: DateTime<Utc>,
}

impl CardSession {
    pub fn new(mode: SessionMode, word_ids: Vec<String>, now: DateTime<Utc>) -> Self {
        let total = word_ids.len();
        Self {
            mode,
            word_ids,
            index: 0,
            stats: CardSessionStats {
                total,
                ..Default::default()
            },
            card_started_at: now,
        }
    }

    pub fn start(
        catalog: &WordCatalog,
        progress: Option<&UserProgress>,
        mode: SessionMode,
        limits: SessionLimits,
        now: DateTime<Utc>,
    ) -> Self {
        let ids = select_session_words_with(catalog.words(), progress, mode, limits);
        tracing::debug!(?mode, words = ids.len(), "card session started");
        Self::new(mode, ids, now)
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn word_ids(&self) -> &[String] {
        &self.word_ids
    }

    pub fn stats(&self) -> CardSessionStats {
        self.stats
    }

    pub fn is_finished(&self) -> bool {
        self.index >= self.word_ids.len()
    }

    pub fn current_word_id(&self) -> Option<&str> {
        self.word_ids.get(self.index).map(String::as_str)
    }

    pub fn current_word<'a>(&self, catalog: &'a WordCatalog) -> Option<&'a WordEntry> {
        self.current_word_id().and_then(|id| catalog.get(id))
    }

    /// Percentage of cards seen, counting the current one
    pub fn progress_percent(&self) -> f64 {
        if self.word_ids.is_empty() {
            return 0.0;
        }
        let seen = (self.index + 1).min(self.word_ids.len());
        seen as f64 / self.word_ids.len() as f64 * 100.0
    }

    /// Record the learner's verdict on the current card and move on.
    ///
    /// Returns `None` once the session is over or when the current id is not
    /// in the catalog; in the latter case the card is skipped.
    pub fn respond(
        &mut self,
        catalog: &WordCatalog,
        user_id: &str,
        known: bool,
        now: DateTime<Utc>,
    ) -> Option<LearningEvent> {
        let word_id = self.current_word_id()?.to_string();
        let word = catalog.get(&word_id);
        self.index += 1;
        let word = match word {
            Some(w) => w,
            None => {
                tracing::warn!(%word_id, "card references unknown word, skipped");
                return None;
            }
        };

        if known {
            self.stats.known += 1;
        } else {
            self.stats.unknown += 1;
        }

        let spent = (now - self.card_started_at).num_seconds().max(0) as u32;
        self.card_started_at = now;

        let action = if known {
            LearningAction::Learned
        } else {
            LearningAction::Reviewed
        };
        Some(LearningEvent::new(
            word_id,
            user_id,
            action,
            known,
            spent,
            word.difficulty,
            now,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_new_mode_skips_learned_and_caps() {
        let catalog = WordCatalog::sample().unwrap();
        let mut progress = UserProgress::new("u");
        progress.learned_words.insert("1".into());
        progress.learned_words.insert("3".into());

        let ids = select_session_words(catalog.words(), Some(&progress), SessionMode::New);
        assert_eq!(ids, vec!["2", "4", "5", "6", "7", "8", "9", "10"]);

        let limits = SessionLimits {
            new_words: 2,
            review_words: 15,
        };
        let capped =
            select_session_words_with(catalog.words(), Some(&progress), SessionMode::New, limits);
        assert_eq!(capped, vec!["2", "4"]);
    }

    #[test]
    fn test_review_mode_learned_not_mastered() {
        let catalog = WordCatalog::sample().unwrap();
        let mut progress = UserProgress::new("u");
        for id in ["1", "2", "5"] {
            progress.learned_words.insert(id.into());
        }
        progress.mastered_words.insert("2".into());

        let ids = select_session_words(catalog.words(), Some(&progress), SessionMode::Review);
        assert_eq!(ids, vec!["1", "5"]);
    }

    #[test]
    fn test_no_progress() {
        let catalog = WordCatalog::sample().unwrap();
        assert_eq!(
            select_session_words(catalog.words(), None, SessionMode::New).len(),
            10
        );
        assert!(select_session_words(catalog.words(), None, SessionMode::Review).is_empty());
    }

    #[test]
    fn test_card_session_walk() {
        let catalog = WordCatalog::sample().unwrap();
        let mut session = CardSession::new(
            SessionMode::New,
            vec!["1".into(), "2".into()],
            now(),
        );
        assert_eq!(session.current_word(&catalog).unwrap().text, "abandon");
        assert_eq!(session.progress_percent(), 50.0);

        let first = session
            .respond(&catalog, "u", true, now() + Duration::seconds(8))
            .unwrap();
        assert_eq!(first.action, LearningAction::Learned);
        assert_eq!(first.time_spent, 8);
        assert_eq!(first.difficulty, 2);

        let second = session
            .respond(&catalog, "u", false, now() + Duration::seconds(20))
            .unwrap();
        assert_eq!(second.action, LearningAction::Reviewed);
        assert!(!second.correct);
        assert_eq!(second.time_spent, 12);

        assert!(session.is_finished());
        assert!(session.current_word(&catalog).is_none());
        assert!(session.respond(&catalog, "u", true, now()).is_none());
        assert_eq!(
            session.stats(),
            CardSessionStats {
                total: 2,
                known: 1,
                unknown: 1
            }
        );
    }

    #[test]
    fn test_unknown_word_is_skipped() {
        let catalog = WordCatalog::sample().unwrap();
        let mut session = CardSession::new(SessionMode::Review, vec!["ghost".into()], now());
        assert!(session.respond(&catalog, "u", true, now()).is_none());
        assert!(session.is_finished());
    }
}
